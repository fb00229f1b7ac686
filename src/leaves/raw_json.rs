//! Raw JSON tree leaf: carries an arbitrary
//! [`serde_json::Value`] through the envelope untouched, for payloads the
//! caller wants passed through without a `Reflect` shape of their own.

use serde_json::Value as Json;

use crate::error::Result;
use crate::impl_reflect_leaf;

impl_reflect_leaf!(Json, "Json", Json::Null);

pub fn json_to_json(v: &Json) -> Json {
    v.clone()
}

pub fn json_from_json(json: &Json, _type_name: &str) -> Result<Json> {
    Ok(json.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_an_object_through_untouched() {
        let v = serde_json::json!({ "b": 1, "a": 2 });
        assert_eq!(json_from_json(&json_to_json(&v), "Json").unwrap(), v);
    }

    #[test]
    fn passes_null_through_untouched() {
        assert_eq!(json_from_json(&Json::Null, "Json").unwrap(), Json::Null);
    }
}
