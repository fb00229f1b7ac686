//! Arbitrary-precision and complex numeric leaves.

use num_bigint::BigInt;
use num_complex::Complex64;
use serde_json::Value as Json;

use crate::error::{Error, Result};
use crate::impl_reflect_leaf;
use crate::leaves::get_ci;

impl_reflect_leaf!(BigInt, "BigInteger", BigInt::from(0));
impl_reflect_leaf!(Complex64, "Complex", Complex64::new(0.0, 0.0));

pub fn big_integer_to_json(v: &BigInt) -> Json {
    Json::String(v.to_string())
}

pub fn big_integer_from_json(json: &Json, type_name: &str) -> Result<BigInt> {
    use std::str::FromStr;
    let text = match json {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        other => return Err(Error::coercion_failed(type_name, format!("`{other}` is not a big integer"))),
    };
    BigInt::from_str(text.trim()).map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

/// `{"real": ..., "imaginary": ...}`.
pub fn complex_to_json(v: &Complex64) -> Json {
    serde_json::json!({ "real": v.re, "imaginary": v.im })
}

pub fn complex_from_json(json: &Json, type_name: &str) -> Result<Complex64> {
    let obj = json
        .as_object()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a {real, imaginary} object"))?;
    let real = get_ci(obj, "real")
        .and_then(Json::as_f64)
        .ok_or_else(|| Error::coercion_failed(type_name, "missing `real`"))?;
    let imaginary = get_ci(obj, "imaginary")
        .and_then(Json::as_f64)
        .ok_or_else(|| Error::coercion_failed(type_name, "missing `imaginary`"))?;
    Ok(Complex64::new(real, imaginary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn big_integer_round_trips_beyond_i64_range() {
        let v = BigInt::from_str("123456789012345678901234567890").unwrap();
        let json = big_integer_to_json(&v);
        assert_eq!(big_integer_from_json(&json, "BigInteger").unwrap(), v);
    }

    #[test]
    fn big_integer_from_json_accepts_plain_number() {
        assert_eq!(big_integer_from_json(&Json::from(7), "BigInteger").unwrap(), BigInt::from(7));
    }

    #[test]
    fn big_integer_from_json_rejects_non_numeric_string() {
        assert!(big_integer_from_json(&Json::String("not-a-number".to_string()), "BigInteger").is_err());
    }

    #[test]
    fn complex_round_trips_through_real_imaginary_object() {
        let v = Complex64::new(1.5, -2.5);
        let json = complex_to_json(&v);
        assert_eq!(json, serde_json::json!({ "real": 1.5, "imaginary": -2.5 }));
        assert_eq!(complex_from_json(&json, "Complex").unwrap(), v);
    }

    #[test]
    fn complex_from_json_rejects_missing_field() {
        let json = serde_json::json!({ "real": 1.0 });
        assert!(complex_from_json(&json, "Complex").is_err());
    }

    #[test]
    fn complex_from_json_accepts_differently_cased_keys() {
        let json = serde_json::json!({ "Real": 1.5, "Imaginary": -2.5 });
        assert_eq!(complex_from_json(&json, "Complex").unwrap(), Complex64::new(1.5, -2.5));
    }
}
