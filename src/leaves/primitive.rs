//! Boolean, integer, floating-point, decimal, char and string leaves.
//! Coercion accepts either the natural JSON shape or its
//! string form, matching hosts that over-quote numeric payloads.

use serde_json::Value as Json;

use crate::error::{Error, Result};
use crate::impl_reflect_leaf;

impl_reflect_leaf!(bool, "bool", false);
impl_reflect_leaf!(i8, "i8", 0);
impl_reflect_leaf!(i16, "i16", 0);
impl_reflect_leaf!(i32, "i32", 0);
impl_reflect_leaf!(i64, "i64", 0);
impl_reflect_leaf!(i128, "i128", 0);
impl_reflect_leaf!(isize, "isize", 0);
impl_reflect_leaf!(u8, "u8", 0);
impl_reflect_leaf!(u16, "u16", 0);
impl_reflect_leaf!(u32, "u32", 0);
impl_reflect_leaf!(u64, "u64", 0);
impl_reflect_leaf!(u128, "u128", 0);
impl_reflect_leaf!(usize, "usize", 0);
impl_reflect_leaf!(f32, "f32", 0.0);
impl_reflect_leaf!(f64, "f64", 0.0);
impl_reflect_leaf!(char, "char", '\0');
impl_reflect_leaf!(String, "String", String::new());
impl_reflect_leaf!(rust_decimal::Decimal, "decimal", rust_decimal::Decimal::ZERO);

pub fn bool_to_json(v: &bool) -> Json {
    Json::Bool(*v)
}

pub fn bool_from_json(json: &Json, type_name: &str) -> Result<bool> {
    match json {
        Json::Bool(b) => Ok(*b),
        Json::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Json::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(Error::coercion_failed(type_name, format!("`{other}` is not a boolean"))),
    }
}

macro_rules! int_coercion {
    ($fn_to:ident, $fn_from:ident, $ty:ty) => {
        pub fn $fn_to(v: &$ty) -> Json {
            Json::from(*v)
        }

        pub fn $fn_from(json: &Json, type_name: &str) -> Result<$ty> {
            if let Some(n) = json.as_i64() {
                return <$ty>::try_from(n)
                    .map_err(|_| Error::coercion_failed(type_name, format!("{n} is out of range")));
            }
            if let Some(n) = json.as_u64() {
                return <$ty>::try_from(n)
                    .map_err(|_| Error::coercion_failed(type_name, format!("{n} is out of range")));
            }
            if let Some(s) = json.as_str() {
                return s
                    .trim()
                    .parse::<$ty>()
                    .map_err(|e| Error::coercion_failed(type_name, e.to_string()));
            }
            Err(Error::coercion_failed(type_name, format!("`{json}` is not an integer")))
        }
    };
}

int_coercion!(i8_to_json, i8_from_json, i8);
int_coercion!(i16_to_json, i16_from_json, i16);
int_coercion!(i32_to_json, i32_from_json, i32);
int_coercion!(i64_to_json, i64_from_json, i64);
int_coercion!(isize_to_json, isize_from_json, isize);
int_coercion!(u8_to_json, u8_from_json, u8);
int_coercion!(u16_to_json, u16_from_json, u16);
int_coercion!(u32_to_json, u32_from_json, u32);
int_coercion!(u64_to_json, u64_from_json, u64);
int_coercion!(usize_to_json, usize_from_json, usize);

pub fn i128_to_json(v: &i128) -> Json {
    Json::String(v.to_string())
}

pub fn i128_from_json(json: &Json, type_name: &str) -> Result<i128> {
    let text = json
        .as_str()
        .map(str::to_owned)
        .or_else(|| json.as_i64().map(|n| n.to_string()))
        .ok_or_else(|| Error::coercion_failed(type_name, format!("`{json}` is not an i128")))?;
    text.trim()
        .parse::<i128>()
        .map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

pub fn u128_to_json(v: &u128) -> Json {
    Json::String(v.to_string())
}

pub fn u128_from_json(json: &Json, type_name: &str) -> Result<u128> {
    let text = json
        .as_str()
        .map(str::to_owned)
        .or_else(|| json.as_u64().map(|n| n.to_string()))
        .ok_or_else(|| Error::coercion_failed(type_name, format!("`{json}` is not a u128")))?;
    text.trim()
        .parse::<u128>()
        .map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

macro_rules! float_coercion {
    ($fn_to:ident, $fn_from:ident, $ty:ty) => {
        pub fn $fn_to(v: &$ty) -> Json {
            if v.is_finite() {
                serde_json::Number::from_f64(*v as f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            } else if v.is_nan() {
                Json::String("NaN".to_string())
            } else if *v > 0.0 {
                Json::String("Infinity".to_string())
            } else {
                Json::String("-Infinity".to_string())
            }
        }

        pub fn $fn_from(json: &Json, type_name: &str) -> Result<$ty> {
            match json {
                Json::Number(n) => n
                    .as_f64()
                    .map(|f| f as $ty)
                    .ok_or_else(|| Error::coercion_failed(type_name, format!("`{n}` has no f64 representation"))),
                Json::String(s) if s.eq_ignore_ascii_case("nan") => Ok(<$ty>::NAN),
                Json::String(s) if s.eq_ignore_ascii_case("infinity") => Ok(<$ty>::INFINITY),
                Json::String(s) if s.eq_ignore_ascii_case("-infinity") => Ok(<$ty>::NEG_INFINITY),
                Json::String(s) => s
                    .trim()
                    .parse::<$ty>()
                    .map_err(|e| Error::coercion_failed(type_name, e.to_string())),
                other => Err(Error::coercion_failed(type_name, format!("`{other}` is not a float"))),
            }
        }
    };
}

float_coercion!(f32_to_json, f32_from_json, f32);
float_coercion!(f64_to_json, f64_from_json, f64);

pub fn char_to_json(v: &char) -> Json {
    Json::String(v.to_string())
}

pub fn char_from_json(json: &Json, type_name: &str) -> Result<char> {
    match json {
        Json::String(s) if s.is_empty() => Ok('\0'),
        Json::String(s) => s
            .chars()
            .next()
            .filter(|_| s.chars().count() == 1)
            .ok_or_else(|| Error::coercion_failed(type_name, format!("`{s}` is not a single character"))),
        Json::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .and_then(char::from_u32)
            .ok_or_else(|| Error::coercion_failed(type_name, format!("`{n}` is not a valid code point"))),
        other => Err(Error::coercion_failed(type_name, format!("`{other}` is not a char"))),
    }
}

pub fn string_to_json(v: &String) -> Json {
    Json::String(v.clone())
}

pub fn string_from_json(json: &Json, type_name: &str) -> Result<String> {
    match json {
        Json::Null => Ok(String::new()),
        Json::String(s) => Ok(s.clone()),
        other => Err(Error::coercion_failed(type_name, format!("`{other}` is not a string"))),
    }
}

pub fn decimal_to_json(v: &rust_decimal::Decimal) -> Json {
    Json::String(v.to_string())
}

pub fn decimal_from_json(json: &Json, type_name: &str) -> Result<rust_decimal::Decimal> {
    use std::str::FromStr;
    let text = match json {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        other => return Err(Error::coercion_failed(type_name, format!("`{other}` is not a decimal"))),
    };
    rust_decimal::Decimal::from_str(text.trim()).map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Json::Bool(true), true)]
    #[case(Json::String("TRUE".to_string()), true)]
    #[case(Json::String("false".to_string()), false)]
    fn bool_from_json_accepts_bool_or_string(#[case] input: Json, #[case] expected: bool) {
        assert_eq!(bool_from_json(&input, "bool").unwrap(), expected);
    }

    #[test]
    fn bool_from_json_rejects_other_shapes() {
        assert!(bool_from_json(&Json::Null, "bool").is_err());
    }

    #[rstest]
    #[case(Json::from(42), 42)]
    #[case(Json::String("-7".to_string()), -7)]
    fn i32_from_json_accepts_number_or_string(#[case] input: Json, #[case] expected: i32) {
        assert_eq!(i32_from_json(&input, "i32").unwrap(), expected);
    }

    #[test]
    fn i32_from_json_rejects_out_of_range() {
        assert!(i32_from_json(&Json::from(i64::MAX), "i32").is_err());
    }

    #[test]
    fn i128_round_trips_through_string_encoding() {
        let v: i128 = i128::MAX;
        let json = i128_to_json(&v);
        assert!(matches!(json, Json::String(_)));
        assert_eq!(i128_from_json(&json, "i128").unwrap(), v);
    }

    #[test]
    fn i128_from_json_accepts_plain_json_number() {
        assert_eq!(i128_from_json(&Json::from(12), "i128").unwrap(), 12);
    }

    #[test]
    fn u128_round_trips_through_string_encoding() {
        let v: u128 = u128::MAX;
        let json = u128_to_json(&v);
        assert_eq!(u128_from_json(&json, "u128").unwrap(), v);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn non_finite_floats_round_trip_as_strings(#[case] v: f64) {
        let json = f64_to_json(&v);
        assert!(matches!(json, Json::String(_)));
        let back = f64_from_json(&json, "f64").unwrap();
        if v.is_nan() {
            assert!(back.is_nan());
        } else {
            assert_eq!(back, v);
        }
    }

    #[test]
    fn finite_float_round_trips_as_number() {
        let json = f64_to_json(&1.5);
        assert_eq!(json, Json::from(1.5));
        assert_eq!(f64_from_json(&json, "f64").unwrap(), 1.5);
    }

    #[test]
    fn char_from_json_empty_string_is_null_char() {
        assert_eq!(char_from_json(&Json::String(String::new()), "char").unwrap(), '\0');
    }

    #[test]
    fn char_from_json_accepts_code_point_number() {
        assert_eq!(char_from_json(&Json::from(65), "char").unwrap(), 'A');
    }

    #[test]
    fn char_from_json_rejects_multi_character_string() {
        assert!(char_from_json(&Json::String("ab".to_string()), "char").is_err());
    }

    #[test]
    fn string_from_json_null_becomes_empty_string() {
        assert_eq!(string_from_json(&Json::Null, "String").unwrap(), "");
    }

    #[test]
    fn decimal_from_json_accepts_number_or_string() {
        use std::str::FromStr;
        let expected = rust_decimal::Decimal::from_str("1.50").unwrap();
        assert_eq!(decimal_from_json(&Json::String("1.50".to_string()), "decimal").unwrap(), expected);
        assert_eq!(decimal_from_json(&Json::from(2), "decimal").unwrap(), rust_decimal::Decimal::from(2));
    }
}
