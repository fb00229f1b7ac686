//! The envelope data model: `SerializedMember`.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// The single wire-level record produced by serialize and consumed by
/// deserialize/populate.
///
/// Invariant: `is_null() <=> value.is_none() && fields.is_empty()
/// && props.is_empty()`. A null envelope still carries `type_name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SerializedMember {
    /// Identifier of this value within its parent (field/property name or
    /// element index string). Absent for top-level/anonymous values.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,

    /// Canonical type-id string. Required unless this is an
    /// explicit null carrier with no other information at all.
    #[serde(rename = "typeName", skip_serializing_if = "Option::is_none", default)]
    pub type_name: Option<String>,

    /// Raw JSON payload for leaf values, or the nested scalar JSON for a
    /// non-decomposed complex value.
    #[serde(
        rename = "valueJsonElement",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub value_json_element: Option<Json>,

    /// Ordered child envelopes, one per serialized field.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fields: Option<Vec<SerializedMember>>,

    /// Ordered child envelopes, one per serialized property.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub props: Option<Vec<SerializedMember>>,
}

impl SerializedMember {
    pub fn null(type_name: impl Into<String>) -> Self {
        SerializedMember {
            name: None,
            type_name: Some(type_name.into()),
            value_json_element: None,
            fields: None,
            props: None,
        }
    }

    pub fn scalar(type_name: impl Into<String>, value: Json) -> Self {
        SerializedMember {
            name: None,
            type_name: Some(type_name.into()),
            value_json_element: Some(value),
            fields: None,
            props: None,
        }
    }

    pub fn complex(
        type_name: impl Into<String>,
        fields: Vec<SerializedMember>,
        props: Vec<SerializedMember>,
    ) -> Self {
        SerializedMember {
            name: None,
            type_name: Some(type_name.into()),
            value_json_element: None,
            fields: if fields.is_empty() { None } else { Some(fields) },
            props: if props.is_empty() { None } else { Some(props) },
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Invariant: `IsNull <=> valueJsonElement is null ∧ fields
    /// is empty ∧ props is empty`.
    pub fn is_null(&self) -> bool {
        matches!(&self.value_json_element, None | Some(Json::Null))
            && self.fields.as_ref().is_none_or(|f| f.is_empty())
            && self.props.as_ref().is_none_or(|p| p.is_empty())
    }

    pub fn fields(&self) -> &[SerializedMember] {
        self.fields.as_deref().unwrap_or(&[])
    }

    pub fn props(&self) -> &[SerializedMember] {
        self.props.as_deref().unwrap_or(&[])
    }

    pub fn field(&self, name: &str) -> Option<&SerializedMember> {
        self.fields().iter().find(|f| f.name.as_deref() == Some(name))
    }

    pub fn prop(&self, name: &str) -> Option<&SerializedMember> {
        self.props().iter().find(|p| p.name.as_deref() == Some(name))
    }

    /// True when the raw payload looks like a `SerializedMember` object
    /// rather than a bare scalar — the "cascade vs direct" distinction.
    pub fn payload_is_envelope_shaped(value: &Json) -> bool {
        matches!(value, Json::Object(map) if map.contains_key("typeName"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_envelope_round_trips_as_typename_only() {
        let env = SerializedMember::null("i32");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json, json!({ "typeName": "i32" }));
        assert!(env.is_null());
    }

    #[test]
    fn scalar_envelope_is_not_null() {
        let env = SerializedMember::scalar("i32", json!(5));
        assert!(!env.is_null());
    }

    #[test]
    fn complex_with_no_members_is_null() {
        let env = SerializedMember::complex("Empty", vec![], vec![]);
        assert!(env.is_null());
    }
}
