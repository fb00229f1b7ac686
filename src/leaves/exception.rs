//! Exception wrapper leaf: captures a raised error as data,
//! `{type, message, innerException?}`, rather than re-throwing it.

use serde_json::Value as Json;

use crate::error::{Error, Result};
use crate::impl_reflect_leaf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReflectException {
    pub exception_type: String,
    pub message: String,
    pub inner: Option<Box<ReflectException>>,
}

impl ReflectException {
    pub fn new(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        ReflectException {
            exception_type: exception_type.into(),
            message: message.into(),
            inner: None,
        }
    }
}

impl_reflect_leaf!(ReflectException, "Exception", ReflectException::default());

pub fn exception_to_json(v: &ReflectException) -> Json {
    let mut obj = serde_json::Map::new();
    obj.insert("type".to_string(), Json::String(v.exception_type.clone()));
    obj.insert("message".to_string(), Json::String(v.message.clone()));
    if let Some(inner) = &v.inner {
        obj.insert("innerException".to_string(), exception_to_json(inner));
    }
    Json::Object(obj)
}

pub fn exception_from_json(json: &Json, type_name: &str) -> Result<ReflectException> {
    let obj = json
        .as_object()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a {type, message} object"))?;
    let exception_type = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::coercion_failed(type_name, "missing `type`"))?
        .to_string();
    let message = obj
        .get("message")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::coercion_failed(type_name, "missing `message`"))?
        .to_string();
    let inner = obj
        .get("innerException")
        .filter(|v| !v.is_null())
        .map(|v| exception_from_json(v, type_name))
        .transpose()?
        .map(Box::new);
    Ok(ReflectException { exception_type, message, inner })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_without_inner_exception() {
        let v = ReflectException::new("ArgumentError", "bad input");
        let json = exception_to_json(&v);
        assert_eq!(json, serde_json::json!({ "type": "ArgumentError", "message": "bad input" }));
        assert_eq!(exception_from_json(&json, "Exception").unwrap(), v);
    }

    #[test]
    fn round_trips_with_nested_inner_exception() {
        let mut v = ReflectException::new("OuterError", "outer");
        v.inner = Some(Box::new(ReflectException::new("InnerError", "inner")));
        let json = exception_to_json(&v);
        assert_eq!(exception_from_json(&json, "Exception").unwrap(), v);
    }

    #[test]
    fn from_json_rejects_missing_message() {
        let json = serde_json::json!({ "type": "Error" });
        assert!(exception_from_json(&json, "Exception").is_err());
    }
}
