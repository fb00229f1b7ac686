//! C-like enums: carried over the wire by variant name, with
//! the underlying discriminant accepted on read for interop with hosts
//! that serialize enums numerically.

use serde_json::Value as Json;
use std::marker::PhantomData;

use crate::converter::{Converter, Engine, InstanceContext};
use crate::diagnostics::Diagnostics;
use crate::envelope::SerializedMember;
use crate::error::{Error, Result};
use crate::reflect::{Reflect, ReflectKind, Reflectable};

/// The generic-bound half of enum support: construction from either the
/// variant name or its discriminant, the inverse of [`Reflect::enum_variant`]
/// / [`Reflect::enum_discriminant`].
pub trait EnumLike: Reflectable {
    fn from_name(name: &str) -> Option<Self>
    where
        Self: Sized;
    fn from_discriminant(value: i64) -> Option<Self>
    where
        Self: Sized;
}

/// Generates [`Reflect`] + [`Reflectable`] + [`EnumLike`] for a C-like enum.
///
/// ```ignore
/// reflect_enum! {
///     enum Status {
///         Active = 0,
///         Inactive = 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! reflect_enum {
    (
        enum $ty:ident {
            $( $variant:ident = $disc:literal ),* $(,)?
        }
    ) => {
        impl $crate::reflect::Reflect for $ty {
            fn type_name(&self) -> String {
                <Self as $crate::reflect::Reflectable>::static_type_name()
            }
            fn as_any(&self) -> &dyn ::std::any::Any { self }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any { self }
            fn clone_boxed(&self) -> Box<dyn $crate::reflect::Reflect> { Box::new(self.clone()) }
            fn reflect_kind(&self) -> $crate::reflect::ReflectKind {
                $crate::reflect::ReflectKind::Enum
            }
            fn enum_variant(&self) -> Option<&'static str> {
                match self {
                    $( $ty::$variant => Some(stringify!($variant)), )*
                }
            }
            fn enum_discriminant(&self) -> Option<i64> {
                match self {
                    $( $ty::$variant => Some($disc), )*
                }
            }
        }

        impl $crate::reflect::Reflectable for $ty {
            fn static_type_name() -> String {
                stringify!($ty).to_string()
            }
            fn create_default() -> Self {
                $crate::enums::EnumLike::from_discriminant(0)
                    .expect("enum has no variant with discriminant 0")
            }
        }

        impl $crate::enums::EnumLike for $ty {
            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( n if n.eq_ignore_ascii_case(stringify!($variant)) => Some($ty::$variant), )*
                    _ => None,
                }
            }
            fn from_discriminant(value: i64) -> Option<Self> {
                match value {
                    $( $disc => Some($ty::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

/// One instance handles every enum that implements [`EnumLike`], carried
/// by name with discriminant fallback on read.
pub struct EnumConverter<T: EnumLike> {
    type_name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: EnumLike> EnumConverter<T> {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(EnumConverter {
            type_name: T::static_type_name(),
            _marker: PhantomData,
        })
    }
}

impl<T: EnumLike> Converter for EnumConverter<T> {
    fn name(&self) -> &'static str {
        "enum"
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
        debug_assert_eq!(value.reflect_kind(), ReflectKind::Enum);
        let variant = value
            .enum_variant()
            .ok_or_else(|| Error::coercion_failed(&self.type_name, "value has no enum variant"))?;
        Ok(SerializedMember::scalar(self.type_name.clone(), Json::String(variant.to_string())))
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
        let parsed = match &json {
            Json::String(name) => T::from_name(name),
            Json::Number(n) => n.as_i64().and_then(T::from_discriminant),
            _ => None,
        };
        parsed
            .map(|v| Box::new(v) as Box<dyn Reflect>)
            .ok_or_else(|| Error::coercion_failed(target_type, format!("`{json}` is not a known variant")))
    }

    fn populate_value(
        &self,
        engine: &dyn Engine,
        target: &mut dyn Reflect,
        envelope: &SerializedMember,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<bool> {
        let replacement = self.deserialize_value(engine, envelope, &self.type_name, depth, diags, None)?;
        match replacement.as_any().downcast_ref::<T>() {
            Some(v) => {
                if let Some(slot) = target.as_any_mut().downcast_mut::<T>() {
                    *slot = v.clone();
                    return Ok(true);
                }
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Serializer;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Status {
        Active,
        Inactive,
    }

    crate::reflect_enum! {
        enum Status {
            Active = 0,
            Inactive = 1,
        }
    }

    #[test]
    fn serialize_value_carries_variant_name() {
        let converter = EnumConverter::<Status>::new();
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let env = converter.serialize_value(&engine, &Status::Inactive, 0, &mut diags).unwrap();
        assert_eq!(env, SerializedMember::scalar("Status", Json::String("Inactive".to_string())));
    }

    #[test]
    fn deserialize_value_accepts_variant_name() {
        let converter = EnumConverter::<Status>::new();
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let envelope = SerializedMember::scalar("Status", Json::String("Active".to_string()));
        let boxed = converter
            .deserialize_value(&engine, &envelope, "Status", 0, &mut diags, None)
            .unwrap();
        assert_eq!(*boxed.as_any().downcast_ref::<Status>().unwrap(), Status::Active);
    }

    #[test]
    fn deserialize_value_falls_back_to_discriminant() {
        let converter = EnumConverter::<Status>::new();
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let envelope = SerializedMember::scalar("Status", Json::from(1));
        let boxed = converter
            .deserialize_value(&engine, &envelope, "Status", 0, &mut diags, None)
            .unwrap();
        assert_eq!(*boxed.as_any().downcast_ref::<Status>().unwrap(), Status::Inactive);
    }

    #[test]
    fn deserialize_value_rejects_unknown_variant() {
        let converter = EnumConverter::<Status>::new();
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let envelope = SerializedMember::scalar("Status", Json::String("Deleted".to_string()));
        assert!(converter.deserialize_value(&engine, &envelope, "Status", 0, &mut diags, None).is_err());
    }

    #[test]
    fn populate_value_replaces_the_whole_enum() {
        let converter = EnumConverter::<Status>::new();
        let engine = Serializer::new();
        let mut diags = Diagnostics::new();
        let mut target = Status::Active;
        let envelope = SerializedMember::scalar("Status", Json::String("Inactive".to_string()));
        let ok = converter.populate_value(&engine, &mut target, &envelope, 0, &mut diags).unwrap();
        assert!(ok);
        assert_eq!(target, Status::Inactive);
    }

    #[test]
    fn create_default_is_the_zero_discriminant_variant() {
        assert_eq!(Status::create_default(), Status::Active);
    }
}
