//! The reflection boundary.
//!
//! Rust has no built-in runtime reflection, so this module defines the
//! contract the rest of the engine consumes: a [`Reflect`] trait object
//! that exposes a value's canonical type name and, for composite values,
//! its fields/properties/elements/entries. Concrete types satisfy it
//! either by hand (leaf and collection impls below) or via the
//! [`reflect_struct!`] macro, which plays the role the host runtime's
//! member-enumeration API plays in the original system — the engine
//! itself never generates code, it only consumes whatever `Reflect`
//! impl it is handed.

use std::any::Any;
use std::fmt;

/// What shape a reflected value has, driving which base-converter path
/// (scalar / struct / tuple / sequence / map / option) applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectKind {
    /// A leaf value carried directly as `valueJsonElement`.
    Scalar,
    /// Decomposed into named fields and properties.
    Struct,
    /// `Item1..ItemN` (+ `Rest` beyond arity 7).
    Tuple,
    /// An ordered sequence (array, `Vec`, ordered set).
    List,
    /// An unordered collection of unique elements.
    Set,
    /// A string-keyed (or string-coercible-keyed) mapping.
    Map,
    /// `Option<T>`, the "Nullable-of-T" case.
    Option,
    /// A C-like enum carried by name or underlying integer.
    Enum,
}

/// One reflected field or property value, as produced by [`Reflect::get_field`]
/// or [`Reflect::get_property`]. `Err` models a throwing getter (the
/// getter-exception policy).
pub type MemberResult = Result<Box<dyn Reflect>, String>;

/// Dynamic, object-safe view onto a value's reflective surface.
///
/// All structural accessors default to "not applicable" (`None`/empty)
/// so a leaf scalar type only needs to implement `type_name`/`as_any*`/
/// `clone_boxed`.
pub trait Reflect: Any + fmt::Debug + Send + Sync {
    /// Canonical type-id string. Stable within one process.
    fn type_name(&self) -> String;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_boxed(&self) -> Box<dyn Reflect>;

    fn reflect_kind(&self) -> ReflectKind {
        ReflectKind::Scalar
    }

    /// Declared (insertion) order field names, excluding non-serialized
    /// fields — field enumeration policy.
    fn field_names(&self) -> Vec<&'static str> {
        Vec::new()
    }
    fn get_field(&self, _name: &str) -> Option<MemberResult> {
        None
    }
    fn set_field(&mut self, _name: &str, _value: Box<dyn Reflect>) -> Option<Result<(), String>> {
        None
    }

    /// Declared (insertion) order property names, excluding deprecated
    /// members and indexers — property enumeration policy.
    fn property_names(&self) -> Vec<&'static str> {
        Vec::new()
    }
    fn get_property(&self, _name: &str) -> Option<MemberResult> {
        None
    }
    fn set_property(
        &mut self,
        _name: &str,
        _value: Box<dyn Reflect>,
    ) -> Option<Result<(), String>> {
        None
    }
    fn is_property_writable(&self, _name: &str) -> bool {
        false
    }

    /// Members annotated deprecated; never serialized, regardless of whether their getter
    /// would throw.
    fn deprecated_members(&self) -> &'static [&'static str] {
        &[]
    }

    /// Ordered elements, for [`ReflectKind::List`] / [`ReflectKind::Set`] / [`ReflectKind::Tuple`].
    fn elements(&self) -> Option<Vec<Box<dyn Reflect>>> {
        None
    }
    /// Canonical type-id of this collection's element type, even if empty.
    fn element_type_name(&self) -> Option<String> {
        None
    }

    /// Key/value pairs, for [`ReflectKind::Map`].
    fn entries(&self) -> Option<Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>> {
        None
    }
    fn key_type_name(&self) -> Option<String> {
        None
    }
    fn value_type_name(&self) -> Option<String> {
        None
    }

    /// `Some(None)` for a `None` value, `Some(Some(inner))` for `Some(inner)`,
    /// `None` if this value is not [`ReflectKind::Option`].
    fn option_inner(&self) -> Option<Option<Box<dyn Reflect>>> {
        None
    }

    /// Enum variant name, for [`ReflectKind::Enum`].
    fn enum_variant(&self) -> Option<&'static str> {
        None
    }
    fn enum_discriminant(&self) -> Option<i64> {
        None
    }
}

/// Types that can be constructed from scratch by name and carry a static
/// canonical type-id — the generic-bound counterpart of [`Reflect`],
/// used wherever the engine needs to materialize a value rather than
/// merely inspect one.
pub trait Reflectable: Reflect + Clone + 'static {
    /// Canonical type-id, computable without an instance.
    fn static_type_name() -> String
    where
        Self: Sized;

    /// `create_instance` policy: the zero/default value for
    /// this type. Leaf impls provide the documented default (empty
    /// string, zero, epoch, etc.); struct impls default-construct every
    /// field recursively.
    fn create_default() -> Self
    where
        Self: Sized;

    /// Registers whatever converter *this type's component types* need
    /// into `registry` — the "auto-register on first use" half of generic
    /// support. Leaf types need nothing beyond
    /// [`crate::leaves::LeafConverter`], already registered by the facade
    /// at construction, so the default is a no-op. [`reflect_struct!`]
    /// overrides this to recurse into each field's type via
    /// [`crate::registry::ConverterRegistry::ensure_registered`], and
    /// collection wrapper types (`Option<T>`, `Vec<T>`, ...) do the same
    /// for their component type, so any `Vec<String>`/`Option<Address>`
    /// field reachable from a registered root gets its own converter and
    /// instance factory without the caller registering it explicitly.
    /// Callers should go through `registry.ensure_registered::<Self>()`
    /// rather than calling this directly, so the recursion only runs once
    /// per type.
    fn register_converters(_registry: &crate::registry::ConverterRegistry)
    where
        Self: Sized,
    {
    }
}

/// Generates a [`Reflect`] + [`Reflectable`] impl for a plain struct from
/// a field list, standing in for the host runtime's member-enumeration
/// API. The struct itself must already be defined
/// with `#[derive(Clone, Debug, Default)]`. Deprecated fields are named separately in a trailing
/// `deprecated [...]` list so the matcher never needs to parse an
/// optional attribute per field.
///
/// ```ignore
/// reflect_struct! {
///     struct Person {
///         name: String,
///         age: i32,
///         legacy_id: i32,
///     }
///     deprecated ["legacy_id"]
/// }
/// ```
#[macro_export]
macro_rules! reflect_struct {
    (
        struct $ty:ident {
            $( $field:ident : $fty:ty ),* $(,)?
        }
        $( deprecated [ $( $dep:literal ),* $(,)? ] )?
    ) => {
        impl $crate::reflect::Reflect for $ty {
            fn type_name(&self) -> String {
                <Self as $crate::reflect::Reflectable>::static_type_name()
            }

            fn as_any(&self) -> &dyn ::std::any::Any { self }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any { self }

            fn clone_boxed(&self) -> Box<dyn $crate::reflect::Reflect> {
                Box::new(self.clone())
            }

            fn reflect_kind(&self) -> $crate::reflect::ReflectKind {
                $crate::reflect::ReflectKind::Struct
            }

            fn field_names(&self) -> Vec<&'static str> {
                let deprecated: &[&str] = self.deprecated_members();
                vec![ $( stringify!($field) ),* ]
                    .into_iter()
                    .filter(|n| !deprecated.contains(n))
                    .collect()
            }

            fn get_field(&self, name: &str) -> Option<$crate::reflect::MemberResult> {
                match name {
                    $( stringify!($field) => Some(Ok(Box::new(self.$field.clone()))), )*
                    _ => None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: Box<dyn $crate::reflect::Reflect>,
            ) -> Option<::std::result::Result<(), String>> {
                match name {
                    $(
                        stringify!($field) => {
                            let v = value.as_any().downcast_ref::<$fty>().cloned();
                            Some(match v {
                                Some(v) => { self.$field = v; Ok(()) }
                                None => Err(format!(
                                    "field `{}` expects `{}`",
                                    stringify!($field),
                                    ::std::any::type_name::<$fty>()
                                )),
                            })
                        }
                    )*
                    _ => None,
                }
            }

            fn deprecated_members(&self) -> &'static [&'static str] {
                &[ $( $( $dep ),* )? ]
            }
        }

        impl $crate::reflect::Reflectable for $ty {
            fn static_type_name() -> String {
                stringify!($ty).to_string()
            }

            fn create_default() -> Self {
                Self::default()
            }

            fn register_converters(registry: &$crate::registry::ConverterRegistry) {
                $( registry.ensure_registered::<$fty>(); )*
            }
        }
    };
}

/// Generates a [`Reflect`] + [`Reflectable`] impl for a scalar type that
/// carries no fields/properties of its own.
/// Used for both crate-local newtypes and foreign types (`Reflect` is a
/// local trait, so the orphan rule does not apply).
#[macro_export]
macro_rules! impl_reflect_leaf {
    ($ty:ty, $name:expr, $default:expr) => {
        impl $crate::reflect::Reflect for $ty {
            fn type_name(&self) -> String {
                $name.to_string()
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn clone_boxed(&self) -> Box<dyn $crate::reflect::Reflect> {
                Box::new(self.clone())
            }
        }

        impl $crate::reflect::Reflectable for $ty {
            fn static_type_name() -> String {
                $name.to_string()
            }
            fn create_default() -> Self {
                $default
            }
        }
    };
}

impl Reflect for Box<dyn Reflect> {
    fn type_name(&self) -> String {
        (**self).type_name()
    }
    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        (**self).as_any_mut()
    }
    fn clone_boxed(&self) -> Box<dyn Reflect> {
        (**self).clone_boxed()
    }
    fn reflect_kind(&self) -> ReflectKind {
        (**self).reflect_kind()
    }
}

impl Clone for Box<dyn Reflect> {
    fn clone(&self) -> Self {
        (**self).clone_boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Person {
        name: String,
        age: i32,
        legacy_id: i32,
    }

    reflect_struct! {
        struct Person {
            name: String,
            age: i32,
            legacy_id: i32,
        }
        deprecated ["legacy_id"]
    }

    #[test]
    fn field_names_excludes_deprecated_members() {
        let p = Person::default();
        assert_eq!(p.field_names(), vec!["name", "age"]);
    }

    #[test]
    fn get_field_returns_a_cloned_boxed_value() {
        let p = Person { name: "Ada".to_string(), age: 30, legacy_id: 0 };
        let boxed = p.get_field("name").unwrap().unwrap();
        assert_eq!(boxed.as_any().downcast_ref::<String>().unwrap(), "Ada");
    }

    #[test]
    fn get_field_on_unknown_name_returns_none() {
        let p = Person::default();
        assert!(p.get_field("nonexistent").is_none());
    }

    #[test]
    fn set_field_rejects_a_type_mismatched_value() {
        let mut p = Person::default();
        let wrong = Box::new(42i32) as Box<dyn Reflect>;
        let result = p.set_field("name", wrong).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn set_field_replaces_the_value_on_a_type_match() {
        let mut p = Person::default();
        let value = Box::new("Grace".to_string()) as Box<dyn Reflect>;
        p.set_field("name", value).unwrap().unwrap();
        assert_eq!(p.name, "Grace");
    }

    #[test]
    fn static_type_name_is_the_bare_struct_name() {
        assert_eq!(Person::static_type_name(), "Person");
    }

    #[test]
    fn boxed_reflect_clone_delegates_to_clone_boxed() {
        let boxed: Box<dyn Reflect> = Box::new(Person { name: "Ada".to_string(), age: 1, legacy_id: 0 });
        let cloned = boxed.clone();
        assert_eq!(cloned.type_name(), "Person");
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Team {
        name: String,
        members: Vec<String>,
        captain: Option<String>,
    }

    crate::reflect_struct! {
        struct Team {
            name: String,
            members: Vec<String>,
            captain: Option<String>,
        }
    }

    #[test]
    fn registering_a_struct_recursively_registers_its_wrapper_typed_fields() {
        let s = crate::facade::Serializer::new();
        s.register::<Team>();
        assert!(!s.registry().chain("Vec<String>").is_empty());
        assert!(!s.registry().chain("Option<String>").is_empty());
    }

    #[test]
    fn struct_with_wrapper_typed_fields_round_trips_without_data_loss() {
        let s = crate::facade::Serializer::new();
        let original = Team {
            name: "Rocket".to_string(),
            members: vec!["Ada".to_string(), "Grace".to_string()],
            captain: Some("Ada".to_string()),
        };
        let (env, _) = s.serialize(&original).unwrap();
        assert!(env.field("members").unwrap().value_json_element.is_some());
        let (back, _) = s.deserialize::<Team>(&env).unwrap();
        assert_eq!(back, original);
    }
}
