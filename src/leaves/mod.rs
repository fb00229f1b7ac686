//! Leaf converters: scalar types carried directly as
//! `valueJsonElement` rather than decomposed into fields/properties.
//!
//! Every leaf type gets exactly one [`LeafConverter<T>`] instance rather
//! than a bespoke `impl Converter` — the converter itself is generic over
//! `T`, parameterized by a pair of plain `fn` pointers that do the actual
//! JSON<->value coercion. This mirrors the base-converter-template idea
//! behind [`crate::converter::StructConverter`]: one piece of dispatch and
//! error-handling machinery, reused across every scalar type.

pub mod exception;
pub mod identifiers;
pub mod numeric;
pub mod primitive;
pub mod raw_json;
pub mod temporal;

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::converter::{Converter, Engine, InstanceContext};
use crate::diagnostics::Diagnostics;
use crate::envelope::SerializedMember;
use crate::error::Result;
use crate::reflect::{Reflect, Reflectable};

/// Looks up `key` in `obj` without regard to case, for the handful of leaf
/// shapes (`Complex`, `IPEndPoint`) whose keys the wire format doesn't
/// canonicalize.
pub(crate) fn get_ci<'a>(obj: &'a serde_json::Map<String, Json>, key: &str) -> Option<&'a Json> {
    obj.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
}

/// A scalar converter generic over `T`, built from a pair of stateless
/// coercion functions. `to_json` never fails;
/// `from_json` returns [`crate::error::Error::CoercionFailed`] on a shape
/// it cannot read.
pub struct LeafConverter<T: Reflectable> {
    type_name: String,
    to_json: fn(&T) -> Json,
    from_json: fn(&Json, &str) -> Result<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflectable> LeafConverter<T> {
    pub fn new(
        type_name: impl Into<String>,
        to_json: fn(&T) -> Json,
        from_json: fn(&Json, &str) -> Result<T>,
    ) -> Arc<Self> {
        Arc::new(LeafConverter {
            type_name: type_name.into(),
            to_json,
            from_json,
            _marker: PhantomData,
        })
    }
}

impl<T: Reflectable> Converter for LeafConverter<T> {
    fn name(&self) -> &'static str {
        "leaf"
    }

    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn serialize_value(
        &self,
        _engine: &dyn Engine,
        value: &dyn Reflect,
        _depth: usize,
        _diags: &mut Diagnostics,
    ) -> Result<SerializedMember> {
        let typed = value
            .as_any()
            .downcast_ref::<T>()
            .expect("LeafConverter dispatched to a value of a different type");
        Ok(SerializedMember::scalar(self.type_name.clone(), (self.to_json)(typed)))
    }

    fn deserialize_value(
        &self,
        _engine: &dyn Engine,
        envelope: &SerializedMember,
        target_type: &str,
        _depth: usize,
        _diags: &mut Diagnostics,
        _ctx: Option<&mut InstanceContext>,
    ) -> Result<Box<dyn Reflect>> {
        if envelope.is_null() {
            return Ok(Box::new(T::create_default()));
        }
        let json = envelope.value_json_element.clone().unwrap_or(Json::Null);
        Ok(Box::new((self.from_json)(&json, target_type)?))
    }

    fn populate_value(
        &self,
        _engine: &dyn Engine,
        target: &mut dyn Reflect,
        envelope: &SerializedMember,
        _depth: usize,
        _diags: &mut Diagnostics,
    ) -> Result<bool> {
        if envelope.is_null() {
            return Ok(true);
        }
        let json = envelope.value_json_element.clone().unwrap_or(Json::Null);
        let parsed = (self.from_json)(&json, &self.type_name)?;
        match target.as_any_mut().downcast_mut::<T>() {
            Some(slot) => {
                *slot = parsed;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Serializer;

    #[test]
    fn serialize_value_carries_to_json_output_as_the_scalar_payload() {
        let converter = LeafConverter::<i32>::new("i32", primitive::i32_to_json, primitive::i32_from_json);
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let env = converter.serialize_value(&engine, &42i32, 0, &mut diags).unwrap();
        assert_eq!(env, SerializedMember::scalar("i32", Json::from(42)));
    }

    #[test]
    fn deserialize_value_on_null_envelope_yields_create_default() {
        let converter = LeafConverter::<i32>::new("i32", primitive::i32_to_json, primitive::i32_from_json);
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let envelope = SerializedMember::null("i32");
        let boxed = converter
            .deserialize_value(&engine, &envelope, "i32", 0, &mut diags, None)
            .unwrap();
        assert_eq!(*boxed.as_any().downcast_ref::<i32>().unwrap(), i32::create_default());
    }

    #[test]
    fn populate_value_overwrites_the_existing_scalar() {
        let converter = LeafConverter::<i32>::new("i32", primitive::i32_to_json, primitive::i32_from_json);
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let mut target: i32 = 1;
        let envelope = SerializedMember::scalar("i32", Json::from(99));
        let ok = converter
            .populate_value(&engine, &mut target, &envelope, 0, &mut diags)
            .unwrap();
        assert!(ok);
        assert_eq!(target, 99);
    }
}

