//! The top-level facade: [`Serializer`], the `Engine`
//! implementation every converter recurses through, and [`SerializerOptions`]
//! for constructing one.

use std::sync::Arc;

use crate::converter::{Engine, InstanceContext, StructConverter, MAX_DEPTH};
use crate::diagnostics::Diagnostics;
use crate::enums::{EnumConverter, EnumLike};
use crate::envelope::SerializedMember;
use crate::error::{Error, Result};
use crate::invoker::{self, Argument, Callable, MethodRegistry};
use crate::leaves::exception::{exception_from_json, exception_to_json, ReflectException};
use crate::leaves::identifiers::{
    guid_from_json, guid_to_json, ip_address_from_json, ip_address_to_json, ip_endpoint_from_json,
    ip_endpoint_to_json, uri_from_json, uri_to_json, version_from_json, version_to_json, DottedVersion,
};
use crate::leaves::numeric::{
    big_integer_from_json, big_integer_to_json, complex_from_json, complex_to_json,
};
use crate::leaves::primitive::{
    bool_from_json, bool_to_json, char_from_json, char_to_json, decimal_from_json, decimal_to_json,
    f32_from_json, f32_to_json, f64_from_json, f64_to_json, i128_from_json, i128_to_json, i16_from_json,
    i16_to_json, i32_from_json, i32_to_json, i64_from_json, i64_to_json, i8_from_json, i8_to_json,
    isize_from_json, isize_to_json, string_from_json, string_to_json, u128_from_json, u128_to_json,
    u16_from_json, u16_to_json, u32_from_json, u32_to_json, u64_from_json, u64_to_json, u8_from_json,
    u8_to_json, usize_from_json, usize_to_json,
};
use crate::leaves::raw_json::{json_from_json, json_to_json};
use crate::leaves::temporal::{
    date_from_json, date_to_json, datetime_from_json, datetime_offset_from_json, datetime_offset_to_json,
    datetime_to_json, time_from_json, time_to_json, timespan_from_json, timespan_to_json,
};
use crate::leaves::LeafConverter;
use crate::reflect::{Reflect, Reflectable};
use crate::registry::ConverterRegistry;
use crate::type_id::TypeKind;

/// Construction-time configuration for a [`Serializer`]: recursion bound,
/// cache sizing, and a blacklist seed, analogous to an extension host's
/// startup config object.
#[derive(Debug, Clone, Default)]
pub struct SerializerOptions {
    max_depth: Option<usize>,
    cache_capacity: Option<usize>,
    blacklist_seed: Vec<String>,
}

impl SerializerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps recursion below the absolute ceiling [`MAX_DEPTH`]. Values
    /// above it are clamped.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth.min(MAX_DEPTH));
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    pub fn blacklist(mut self, type_name: impl Into<String>) -> Self {
        self.blacklist_seed.push(type_name.into());
        self
    }
}

/// The engine entry point: owns the converter registry (which in turn
/// owns the per-type instance factories) and the method registry.
/// Implements [`Engine`] so converters can recurse through it without
/// depending on this concrete type.
pub struct Serializer {
    registry: ConverterRegistry,
    methods: MethodRegistry,
    options: SerializerOptions,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_options(SerializerOptions::default())
    }

    pub fn with_options(options: SerializerOptions) -> Self {
        let registry = match options.cache_capacity {
            Some(capacity) => ConverterRegistry::with_capacity(capacity),
            None => ConverterRegistry::new(),
        };
        let serializer = Serializer {
            registry,
            methods: MethodRegistry::new(),
            options,
        };
        serializer.register_builtin_converters();
        serializer.registry.blacklist_many(serializer.options.blacklist_seed.clone());
        serializer
    }

    fn register_builtin_converters(&self) {
        self.registry.add(LeafConverter::<bool>::new("bool", bool_to_json, bool_from_json));
        self.registry.add(LeafConverter::<i8>::new("i8", i8_to_json, i8_from_json));
        self.registry.add(LeafConverter::<i16>::new("i16", i16_to_json, i16_from_json));
        self.registry.add(LeafConverter::<i32>::new("i32", i32_to_json, i32_from_json));
        self.registry.add(LeafConverter::<i64>::new("i64", i64_to_json, i64_from_json));
        self.registry.add(LeafConverter::<i128>::new("i128", i128_to_json, i128_from_json));
        self.registry.add(LeafConverter::<isize>::new("isize", isize_to_json, isize_from_json));
        self.registry.add(LeafConverter::<u8>::new("u8", u8_to_json, u8_from_json));
        self.registry.add(LeafConverter::<u16>::new("u16", u16_to_json, u16_from_json));
        self.registry.add(LeafConverter::<u32>::new("u32", u32_to_json, u32_from_json));
        self.registry.add(LeafConverter::<u64>::new("u64", u64_to_json, u64_from_json));
        self.registry.add(LeafConverter::<u128>::new("u128", u128_to_json, u128_from_json));
        self.registry.add(LeafConverter::<usize>::new("usize", usize_to_json, usize_from_json));
        self.registry.add(LeafConverter::<f32>::new("f32", f32_to_json, f32_from_json));
        self.registry.add(LeafConverter::<f64>::new("f64", f64_to_json, f64_from_json));
        self.registry.add(LeafConverter::<char>::new("char", char_to_json, char_from_json));
        self.registry
            .add(LeafConverter::<String>::new("String", string_to_json, string_from_json));
        self.registry.add(LeafConverter::<rust_decimal::Decimal>::new(
            "decimal",
            decimal_to_json,
            decimal_from_json,
        ));
        self.registry.add(LeafConverter::<chrono::DateTime<chrono::Utc>>::new(
            "DateTimeOffset",
            datetime_offset_to_json,
            datetime_offset_from_json,
        ));
        self.registry.add(LeafConverter::<chrono::NaiveDateTime>::new(
            "DateTime",
            datetime_to_json,
            datetime_from_json,
        ));
        self.registry
            .add(LeafConverter::<chrono::NaiveDate>::new("Date", date_to_json, date_from_json));
        self.registry
            .add(LeafConverter::<chrono::NaiveTime>::new("Time", time_to_json, time_from_json));
        self.registry.add(LeafConverter::<chrono::TimeDelta>::new(
            "TimeSpan",
            timespan_to_json,
            timespan_from_json,
        ));
        self.registry.add(LeafConverter::<uuid::Uuid>::new("Guid", guid_to_json, guid_from_json));
        self.registry.add(LeafConverter::<std::net::IpAddr>::new(
            "IPAddress",
            ip_address_to_json,
            ip_address_from_json,
        ));
        self.registry.add(LeafConverter::<std::net::SocketAddr>::new(
            "IPEndPoint",
            ip_endpoint_to_json,
            ip_endpoint_from_json,
        ));
        self.registry.add(LeafConverter::<url::Url>::new("Uri", uri_to_json, uri_from_json));
        self.registry
            .add(LeafConverter::<DottedVersion>::new("Version", version_to_json, version_from_json));
        self.registry.add(LeafConverter::<num_bigint::BigInt>::new(
            "BigInteger",
            big_integer_to_json,
            big_integer_from_json,
        ));
        self.registry.add(LeafConverter::<num_complex::Complex64>::new(
            "Complex",
            complex_to_json,
            complex_from_json,
        ));
        self.registry
            .add(LeafConverter::<serde_json::Value>::new("Json", json_to_json, json_from_json));
        self.registry.add(LeafConverter::<ReflectException>::new(
            "Exception",
            exception_to_json,
            exception_from_json,
        ));
        self.registry.add(Arc::new(StructConverter));
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    fn max_depth(&self) -> usize {
        self.options.max_depth.unwrap_or(MAX_DEPTH)
    }

    /// Registers `T`'s instance factory and whatever converter(s) its
    /// shape needs, idempotently — including, recursively, every wrapper
    /// and field type `T` is built from.
    pub fn register<T: Reflectable>(&self) {
        self.registry.ensure_registered::<T>();
    }

    /// Declares `T` as an interface/abstract type: no
    /// instance factory is registered, so `create_instance` on it always
    /// fails unless a subtype is registered under its own name.
    pub fn register_as(&self, type_name: impl Into<String>, kind: TypeKind) {
        self.registry.declare_kind(type_name, kind);
    }

    /// Registers an enum type via its [`EnumLike`] impl.
    pub fn register_enum<T: EnumLike>(&self) {
        self.registry.add(EnumConverter::<T>::new());
        self.register::<T>();
    }

    pub fn declare_relations(
        &self,
        type_name: impl Into<String>,
        bases: impl IntoIterator<Item = String>,
        interfaces: impl IntoIterator<Item = String>,
    ) {
        self.registry.declare_relations(type_name, bases, interfaces);
    }

    pub fn register_method(&self, type_name: impl Into<String>, method: Arc<dyn Callable>) {
        self.methods.register(type_name, method);
    }

    // -- public generic API -------------------------------------------------

    pub fn serialize<T: Reflectable>(&self, value: &T) -> Result<(SerializedMember, Diagnostics)> {
        self.register::<T>();
        let mut diags = Diagnostics::new();
        let env = self.serialize_dyn(value, &T::static_type_name(), 0, &mut diags)?;
        Ok((env, diags))
    }

    pub fn deserialize<T: Reflectable>(&self, envelope: &SerializedMember) -> Result<(T, Diagnostics)> {
        self.register::<T>();
        let mut diags = Diagnostics::new();
        let boxed = self.deserialize_dyn(envelope, &T::static_type_name(), 0, &mut diags, None)?;
        let typed = boxed
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::TypeMismatch {
                expected: T::static_type_name(),
                actual: boxed.type_name(),
            })?;
        Ok((typed, diags))
    }

    pub fn populate<T: Reflectable>(&self, target: &mut T, envelope: &SerializedMember) -> Result<(bool, Diagnostics)> {
        self.register::<T>();
        let mut diags = Diagnostics::new();
        let ok = self.populate_dyn(target, envelope, &T::static_type_name(), 0, &mut diags)?;
        Ok((ok, diags))
    }

    pub async fn invoke<T: Reflectable>(
        &self,
        receiver: &mut T,
        method_name: &str,
        args: Vec<Argument>,
    ) -> Result<(Box<dyn Reflect>, Diagnostics)> {
        let mut diags = Diagnostics::new();
        let result = invoker::invoke(self, &self.methods, receiver, method_name, args, &mut diags).await?;
        Ok((result, diags))
    }
}

impl Engine for Serializer {
    fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    fn serialize_dyn(
        &self,
        value: &dyn Reflect,
        declared_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<SerializedMember> {
        if depth > self.max_depth() {
            return Err(Error::DepthExceeded(declared_type.to_string(), self.max_depth()));
        }
        let runtime_type = value.type_name();
        if self.registry.is_blacklisted(&runtime_type) {
            return Ok(SerializedMember::null(runtime_type));
        }
        let chain = self.registry.chain(&runtime_type);
        let converter = chain
            .first()
            .ok_or_else(|| Error::UnknownType(runtime_type.clone()))?;
        converter.serialize_value(self, value, depth, diags)
    }

    fn deserialize_dyn(
        &self,
        envelope: &SerializedMember,
        fallback_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
        ctx: Option<&mut InstanceContext>,
    ) -> Result<Box<dyn Reflect>> {
        if depth > self.max_depth() {
            return Err(Error::DepthExceeded(fallback_type.to_string(), self.max_depth()));
        }
        let type_name = envelope.type_name.clone().unwrap_or_else(|| fallback_type.to_string());
        if self.registry.is_blacklisted(&type_name) {
            return Err(Error::cannot_instantiate(type_name, "type is blacklisted"));
        }
        if !self.registry.kind_of(&type_name).is_instantiable() {
            // Interface/abstract: a non-null payload can never resolve to a
            // concrete implementer here, but a null envelope is the
            // documented escape hatch rather than an error.
            if envelope.is_null() {
                return self
                    .registry
                    .create_instance(&type_name)
                    .ok_or_else(|| Error::UnknownType(type_name.clone()));
            }
            return Err(Error::cannot_instantiate(type_name, "type is an interface or abstract base"));
        }
        let chain = self.registry.chain(&type_name);
        let converter = chain.first().ok_or_else(|| Error::UnknownType(type_name.clone()))?;
        converter.deserialize_value(self, envelope, &type_name, depth, diags, ctx)
    }

    fn populate_dyn(
        &self,
        target: &mut dyn Reflect,
        envelope: &SerializedMember,
        fallback_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<bool> {
        if depth > self.max_depth() {
            return Err(Error::DepthExceeded(fallback_type.to_string(), self.max_depth()));
        }
        let type_name = envelope.type_name.clone().unwrap_or_else(|| fallback_type.to_string());
        let chain = self.registry.chain(&type_name);
        let converter = chain.first().ok_or_else(|| Error::UnknownType(type_name.clone()))?;
        converter.populate_value(self, target, envelope, depth, diags)
    }

    fn create_instance(&self, type_name: &str) -> Result<Box<dyn Reflect>> {
        let kind = self.registry.kind_of(type_name);
        if !kind.is_instantiable() {
            return Err(Error::cannot_instantiate(type_name, "type is an interface or abstract base"));
        }
        self.registry
            .create_instance(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    fn kind_of(&self, type_name: &str) -> TypeKind {
        self.registry.kind_of(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    crate::reflect_struct! {
        struct Point {
            x: i32,
            y: i32,
        }
    }

    #[test]
    fn register_is_idempotent_across_repeated_calls() {
        let s = Serializer::new();
        s.register::<Point>();
        s.register::<Point>();
        let (env, _) = s.serialize(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(env.fields().len(), 2);
    }

    #[test]
    fn register_as_interface_blocks_direct_instantiation() {
        let s = Serializer::new();
        s.register::<Point>();
        s.register_as("Point", TypeKind::Interface);
        assert!(s.create_instance("Point").is_err());
    }

    #[test]
    fn max_depth_is_clamped_to_the_hard_ceiling() {
        let options = SerializerOptions::new().max_depth(MAX_DEPTH + 100);
        let s = Serializer::with_options(options);
        assert_eq!(s.max_depth(), MAX_DEPTH);
    }

    #[test]
    fn blacklist_seed_is_applied_at_construction() {
        let options = SerializerOptions::new().blacklist("Point");
        let s = Serializer::with_options(options);
        s.register::<Point>();
        let (env, _) = s.serialize(&Point { x: 1, y: 2 }).unwrap();
        assert!(env.is_null());
    }

    #[test]
    fn serialize_then_deserialize_round_trips_a_struct() {
        let s = Serializer::new();
        let original = Point { x: 3, y: 4 };
        let (env, _) = s.serialize(&original).unwrap();
        let (back, _) = s.deserialize::<Point>(&env).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn populate_mutates_an_existing_instance_in_place() {
        let s = Serializer::new();
        let (env, _) = s.serialize(&Point { x: 9, y: 9 }).unwrap();
        let mut target = Point::default();
        let (ok, _) = s.populate(&mut target, &env).unwrap();
        assert!(ok);
        assert_eq!(target, Point { x: 9, y: 9 });
    }
}
