//! Calendar and duration leaves: offset-aware instants,
//! naive date-times, date-only, time-only, and durations. ISO-8601 is the
//! wire form throughout, matching the rest of the JSON ecosystem this
//! engine interoperates with.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde_json::Value as Json;

use crate::error::{Error, Result};
use crate::impl_reflect_leaf;

impl_reflect_leaf!(
    DateTime<Utc>,
    "DateTimeOffset",
    DateTime::<Utc>::from_timestamp(0, 0).unwrap()
);
impl_reflect_leaf!(NaiveDateTime, "DateTime", NaiveDateTime::default());
impl_reflect_leaf!(NaiveDate, "Date", NaiveDate::from_ymd_opt(1, 1, 1).unwrap());
impl_reflect_leaf!(NaiveTime, "Time", NaiveTime::from_hms_opt(0, 0, 0).unwrap());
impl_reflect_leaf!(TimeDelta, "TimeSpan", TimeDelta::zero());

pub fn datetime_offset_to_json(v: &DateTime<Utc>) -> Json {
    Json::String(v.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true))
}

pub fn datetime_offset_from_json(json: &Json, type_name: &str) -> Result<DateTime<Utc>> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected an ISO-8601 string"))?;
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

pub fn datetime_to_json(v: &NaiveDateTime) -> Json {
    Json::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

pub fn datetime_from_json(json: &Json, type_name: &str) -> Result<NaiveDateTime> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected an ISO-8601 string"))?;
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

pub fn date_to_json(v: &NaiveDate) -> Json {
    Json::String(v.format("%Y-%m-%d").to_string())
}

pub fn date_from_json(json: &Json, type_name: &str) -> Result<NaiveDate> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a date string"))?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

pub fn time_to_json(v: &NaiveTime) -> Json {
    Json::String(v.format("%H:%M:%S%.f").to_string())
}

pub fn time_from_json(json: &Json, type_name: &str) -> Result<NaiveTime> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a time string"))?;
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

/// `[-]d.hh:mm:ss.fffffff`, the familiar TimeSpan textual form.
pub fn timespan_to_json(v: &TimeDelta) -> Json {
    let negative = v.num_milliseconds() < 0;
    let magnitude = if negative { -*v } else { *v };
    let days = magnitude.num_days();
    let hours = magnitude.num_hours() % 24;
    let minutes = magnitude.num_minutes() % 60;
    let seconds = magnitude.num_seconds() % 60;
    let millis = magnitude.num_milliseconds() % 1000;
    let sign = if negative { "-" } else { "" };
    let text = if days != 0 {
        format!("{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    };
    Json::String(text)
}

pub fn timespan_from_json(json: &Json, type_name: &str) -> Result<TimeDelta> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a timespan string"))?;
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s),
    };
    let (days, rest) = match rest.split_once('.') {
        Some((d, r)) if r.contains(':') => (d.parse::<i64>().ok(), r),
        _ => (Some(0), rest),
    };
    let days = days.ok_or_else(|| Error::coercion_failed(type_name, format!("`{s}` has an invalid day component")))?;
    let parts: Vec<&str> = rest.split(':').collect();
    if parts.len() != 3 {
        return Err(Error::coercion_failed(type_name, format!("`{s}` is not hh:mm:ss[.fff]")));
    }
    let hours: i64 = parts[0].parse().map_err(|_| Error::coercion_failed(type_name, "bad hours"))?;
    let minutes: i64 = parts[1].parse().map_err(|_| Error::coercion_failed(type_name, "bad minutes"))?;
    let (seconds, millis) = match parts[2].split_once('.') {
        Some((s, f)) => {
            let s: i64 = s.parse().map_err(|_| Error::coercion_failed(type_name, "bad seconds"))?;
            let f = format!("{f:0<3}");
            let f: i64 = f[..3].parse().map_err(|_| Error::coercion_failed(type_name, "bad fraction"))?;
            (s, f)
        }
        None => (
            parts[2].parse().map_err(|_| Error::coercion_failed(type_name, "bad seconds"))?,
            0,
        ),
    };
    let total_ms = (((days * 24 + hours) * 60 + minutes) * 60 + seconds) * 1000 + millis;
    Ok(TimeDelta::milliseconds(sign * total_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_offset_round_trips_through_rfc3339() {
        let v = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z").unwrap().with_timezone(&Utc);
        let json = datetime_offset_to_json(&v);
        assert_eq!(datetime_offset_from_json(&json, "DateTimeOffset").unwrap(), v);
    }

    #[test]
    fn naive_datetime_round_trips() {
        let v = NaiveDateTime::parse_from_str("2024-03-01T12:30:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        let json = datetime_to_json(&v);
        assert_eq!(datetime_from_json(&json, "DateTime").unwrap(), v);
    }

    #[test]
    fn date_round_trips() {
        let v = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let json = date_to_json(&v);
        assert_eq!(date_from_json(&json, "Date").unwrap(), v);
    }

    #[test]
    fn time_round_trips() {
        let v = NaiveTime::from_hms_opt(12, 30, 45).unwrap();
        let json = time_to_json(&v);
        assert_eq!(time_from_json(&json, "Time").unwrap(), v);
    }

    #[test]
    fn timespan_formats_without_days_when_zero() {
        let v = TimeDelta::milliseconds(3_725_500);
        let json = timespan_to_json(&v);
        assert_eq!(json, Json::String("01:02:05.500".to_string()));
    }

    #[test]
    fn timespan_includes_day_component_when_present() {
        let v = TimeDelta::days(2) + TimeDelta::hours(3);
        let json = timespan_to_json(&v);
        assert_eq!(json, Json::String("2.03:00:00.000".to_string()));
    }

    #[test]
    fn timespan_round_trips_negative_value() {
        let v = -(TimeDelta::minutes(90));
        let json = timespan_to_json(&v);
        assert_eq!(timespan_from_json(&json, "TimeSpan").unwrap(), v);
    }

    #[test]
    fn timespan_from_json_rejects_malformed_string() {
        assert!(timespan_from_json(&Json::String("not-a-timespan".to_string()), "TimeSpan").is_err());
    }
}
