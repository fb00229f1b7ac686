//! Generic collection converters: `Option<T>`, `Vec<T>`,
//! `HashSet<T>`/`BTreeSet<T>`, `HashMap<String, V>`/`BTreeMap<String, V>`,
//! and tuples of arity 1 through 7 (with arity ≥ 8 expressed by nesting a
//! tuple in the final slot, the `Item1..Item7` + `Rest` idea translated
//! into Rust's own tuple nesting rather than a bespoke `Rest` field).
//!
//! Every wrapper type gets its own `Reflect`/`Reflectable` impl here
//! (blanket `impl<T: Reflectable>`), and its own converter generic over
//! the element/component types — the same "one template, many
//! instantiations" shape as [`crate::leaves::LeafConverter`].

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::converter::{reborrow_ctx, Converter, Engine, InstanceContext, MAX_DEPTH};
use crate::diagnostics::Diagnostics;
use crate::envelope::SerializedMember;
use crate::error::{Error, Result};
use crate::reflect::{Reflect, ReflectKind, Reflectable};

// -- Option<T> -----------------------------------

impl<T: Reflectable> Reflect for Option<T> {
    fn type_name(&self) -> String {
        format!("Option<{}>", T::static_type_name())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn clone_boxed(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }
    fn reflect_kind(&self) -> ReflectKind {
        ReflectKind::Option
    }
    fn option_inner(&self) -> Option<Option<Box<dyn Reflect>>> {
        Some(self.as_ref().map(|v| Box::new(v.clone()) as Box<dyn Reflect>))
    }
}

impl<T: Reflectable> Reflectable for Option<T> {
    fn static_type_name() -> String {
        format!("Option<{}>", T::static_type_name())
    }
    fn create_default() -> Self {
        None
    }
    fn register_converters(registry: &crate::registry::ConverterRegistry) {
        registry.add(NullableConverter::<T>::new());
        registry.ensure_registered::<T>();
    }
}

pub struct NullableConverter<T: Reflectable> {
    type_name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflectable> NullableConverter<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(NullableConverter {
            type_name: Option::<T>::static_type_name(),
            _marker: PhantomData,
        })
    }
}

impl<T: Reflectable> Converter for NullableConverter<T> {
    fn name(&self) -> &'static str {
        "nullable"
    }

    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn serialize_value(
        &self,
        engine: &dyn Engine,
        value: &dyn Reflect,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<SerializedMember> {
        let opt = value
            .as_any()
            .downcast_ref::<Option<T>>()
            .expect("NullableConverter dispatched to a value of a different type");
        match opt {
            None => Ok(SerializedMember::null(self.type_name.clone())),
            Some(inner) => engine.serialize_dyn(inner, &T::static_type_name(), depth + 1, diags),
        }
    }

    fn deserialize_value(
        &self,
        engine: &dyn Engine,
        envelope: &SerializedMember,
        _target_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
        ctx: Option<&mut InstanceContext>,
    ) -> Result<Box<dyn Reflect>> {
        if envelope.is_null() {
            return Ok(Box::new(None::<T>));
        }
        let inner = engine.deserialize_dyn(envelope, &T::static_type_name(), depth + 1, diags, ctx)?;
        let typed = inner
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::TypeMismatch {
                expected: T::static_type_name(),
                actual: inner.type_name(),
            })?;
        Ok(Box::new(Some(typed)))
    }

    fn populate_value(
        &self,
        engine: &dyn Engine,
        target: &mut dyn Reflect,
        envelope: &SerializedMember,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<bool> {
        let actual_type_name = target.type_name();
        let opt = target
            .as_any_mut()
            .downcast_mut::<Option<T>>()
            .ok_or_else(|| Error::TypeMismatch {
                expected: self.type_name.clone(),
                actual: actual_type_name,
            })?;
        if envelope.is_null() {
            *opt = None;
            return Ok(true);
        }
        if let Some(inner) = opt.as_mut() {
            return engine.populate_dyn(inner, envelope, &T::static_type_name(), depth + 1, diags);
        }
        let mut fresh = T::create_default();
        let ok = engine.populate_dyn(&mut fresh, envelope, &T::static_type_name(), depth + 1, diags)?;
        *opt = Some(fresh);
        Ok(ok)
    }
}

// -- Vec<T> ---------------------------

impl<T: Reflectable> Reflect for Vec<T> {
    fn type_name(&self) -> String {
        format!("Vec<{}>", T::static_type_name())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn clone_boxed(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }
    fn reflect_kind(&self) -> ReflectKind {
        ReflectKind::List
    }
    fn elements(&self) -> Option<Vec<Box<dyn Reflect>>> {
        Some(self.iter().map(|v| Box::new(v.clone()) as Box<dyn Reflect>).collect())
    }
    fn element_type_name(&self) -> Option<String> {
        Some(T::static_type_name())
    }
}

impl<T: Reflectable> Reflectable for Vec<T> {
    fn static_type_name() -> String {
        format!("Vec<{}>", T::static_type_name())
    }
    fn create_default() -> Self {
        Vec::new()
    }
    fn register_converters(registry: &crate::registry::ConverterRegistry) {
        registry.add(ListConverter::<T>::new());
        registry.ensure_registered::<T>();
    }
}

pub struct ListConverter<T: Reflectable> {
    type_name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflectable> ListConverter<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(ListConverter {
            type_name: Vec::<T>::static_type_name(),
            _marker: PhantomData,
        })
    }
}

impl<T: Reflectable> Converter for ListConverter<T> {
    fn name(&self) -> &'static str {
        "list"
    }

    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn serialize_value(
        &self,
        engine: &dyn Engine,
        value: &dyn Reflect,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<SerializedMember> {
        if depth > MAX_DEPTH {
            return Err(Error::DepthExceeded(self.type_name.clone(), MAX_DEPTH));
        }
        let vec = value
            .as_any()
            .downcast_ref::<Vec<T>>()
            .expect("ListConverter dispatched to a value of a different type");
        let mut items = Vec::with_capacity(vec.len());
        for item in vec {
            let env = engine.serialize_dyn(item, &T::static_type_name(), depth + 1, diags)?;
            items.push(serde_json::to_value(&env)?);
        }
        Ok(SerializedMember::scalar(self.type_name.clone(), Json::Array(items)))
    }

    fn deserialize_value(
        &self,
        engine: &dyn Engine,
        envelope: &SerializedMember,
        target_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
        mut ctx: Option<&mut InstanceContext>,
    ) -> Result<Box<dyn Reflect>> {
        if envelope.is_null() {
            return Ok(Box::new(Vec::<T>::new()));
        }
        let json = envelope.value_json_element.clone().unwrap_or(Json::Null);
        let arr = json
            .as_array()
            .ok_or_else(|| Error::coercion_failed(target_type, "expected a JSON array"))?;
        let mut out = Vec::with_capacity(arr.len());
        for item_json in arr {
            let child_env: SerializedMember = serde_json::from_value(item_json.clone())?;
            let value = engine.deserialize_dyn(
                &child_env,
                &T::static_type_name(),
                depth + 1,
                diags,
                reborrow_ctx(&mut ctx),
            )?;
            let typed = value
                .as_any()
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| Error::TypeMismatch {
                    expected: T::static_type_name(),
                    actual: value.type_name(),
                })?;
            out.push(typed);
        }
        Ok(Box::new(out))
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
        match replacement.as_any().downcast_ref::<Vec<T>>() {
            Some(v) => match target.as_any_mut().downcast_mut::<Vec<T>>() {
                Some(slot) => {
                    *slot = v.clone();
                    Ok(true)
                }
                None => Ok(false),
            },
            None => Ok(false),
        }
    }
}

// -- HashSet<T> / BTreeSet<T> ------------------------------

macro_rules! impl_set {
    ($set:ident, $name_fmt:literal, $converter:ident, $($bound:path),+) => {
        impl<T: Reflectable $(+ $bound)+> Reflect for $set<T> {
            fn type_name(&self) -> String {
                format!($name_fmt, T::static_type_name())
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
            fn clone_boxed(&self) -> Box<dyn Reflect> {
                Box::new(self.clone())
            }
            fn reflect_kind(&self) -> ReflectKind {
                ReflectKind::Set
            }
            fn elements(&self) -> Option<Vec<Box<dyn Reflect>>> {
                Some(self.iter().map(|v| Box::new(v.clone()) as Box<dyn Reflect>).collect())
            }
            fn element_type_name(&self) -> Option<String> {
                Some(T::static_type_name())
            }
        }

        impl<T: Reflectable $(+ $bound)+> Reflectable for $set<T> {
            fn static_type_name() -> String {
                format!($name_fmt, T::static_type_name())
            }
            fn create_default() -> Self {
                $set::new()
            }
            fn register_converters(registry: &crate::registry::ConverterRegistry) {
                registry.add($converter::<T>::new());
                registry.ensure_registered::<T>();
            }
        }

        pub struct $converter<T: Reflectable $(+ $bound)+> {
            type_name: String,
            _marker: PhantomData<fn() -> T>,
        }

        impl<T: Reflectable $(+ $bound)+> $converter<T> {
            pub fn new() -> Arc<Self> {
                Arc::new($converter {
                    type_name: $set::<T>::static_type_name(),
                    _marker: PhantomData,
                })
            }
        }

        impl<T: Reflectable $(+ $bound)+> Converter for $converter<T> {
            fn name(&self) -> &'static str {
                "set"
            }

            fn target_type_name(&self) -> &str {
                &self.type_name
            }

            fn serialize_value(
                &self,
                engine: &dyn Engine,
                value: &dyn Reflect,
                depth: usize,
                diags: &mut Diagnostics,
            ) -> Result<SerializedMember> {
                if depth > MAX_DEPTH {
                    return Err(Error::DepthExceeded(self.type_name.clone(), MAX_DEPTH));
                }
                let set = value
                    .as_any()
                    .downcast_ref::<$set<T>>()
                    .expect("set converter dispatched to a value of a different type");
                let mut items = Vec::with_capacity(set.len());
                for item in set {
                    let env = engine.serialize_dyn(item, &T::static_type_name(), depth + 1, diags)?;
                    items.push(serde_json::to_value(&env)?);
                }
                Ok(SerializedMember::scalar(self.type_name.clone(), Json::Array(items)))
            }

            fn deserialize_value(
                &self,
                engine: &dyn Engine,
                envelope: &SerializedMember,
                target_type: &str,
                depth: usize,
                diags: &mut Diagnostics,
                mut ctx: Option<&mut InstanceContext>,
            ) -> Result<Box<dyn Reflect>> {
                if envelope.is_null() {
                    return Ok(Box::new($set::<T>::new()));
                }
                let json = envelope.value_json_element.clone().unwrap_or(Json::Null);
                let arr = json
                    .as_array()
                    .ok_or_else(|| Error::coercion_failed(target_type, "expected a JSON array"))?;
                let mut out = $set::new();
                for item_json in arr {
                    let child_env: SerializedMember = serde_json::from_value(item_json.clone())?;
                    let value = engine.deserialize_dyn(
                        &child_env,
                        &T::static_type_name(),
                        depth + 1,
                        diags,
                        reborrow_ctx(&mut ctx),
                    )?;
                    let typed = value
                        .as_any()
                        .downcast_ref::<T>()
                        .cloned()
                        .ok_or_else(|| Error::TypeMismatch {
                            expected: T::static_type_name(),
                            actual: value.type_name(),
                        })?;
                    out.insert(typed);
                }
                Ok(Box::new(out))
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
                match replacement.as_any().downcast_ref::<$set<T>>() {
                    Some(v) => match target.as_any_mut().downcast_mut::<$set<T>>() {
                        Some(slot) => {
                            *slot = v.clone();
                            Ok(true)
                        }
                        None => Ok(false),
                    },
                    None => Ok(false),
                }
            }
        }
    };
}

impl_set!(HashSet, "HashSet<{}>", HashSetConverter, std::hash::Hash, Eq);
impl_set!(BTreeSet, "BTreeSet<{}>", BTreeSetConverter, Ord);

// -- HashMap<String, V> / BTreeMap<String, V> -------

macro_rules! impl_map {
    ($map:ident, $name_fmt:literal, $converter:ident) => {
        impl<V: Reflectable> Reflect for $map<String, V> {
            fn type_name(&self) -> String {
                format!($name_fmt, V::static_type_name())
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
            fn clone_boxed(&self) -> Box<dyn Reflect> {
                Box::new(self.clone())
            }
            fn reflect_kind(&self) -> ReflectKind {
                ReflectKind::Map
            }
            fn entries(&self) -> Option<Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>> {
                Some(
                    self.iter()
                        .map(|(k, v)| (Box::new(k.clone()) as Box<dyn Reflect>, Box::new(v.clone()) as Box<dyn Reflect>))
                        .collect(),
                )
            }
            fn key_type_name(&self) -> Option<String> {
                Some("String".to_string())
            }
            fn value_type_name(&self) -> Option<String> {
                Some(V::static_type_name())
            }
        }

        impl<V: Reflectable> Reflectable for $map<String, V> {
            fn static_type_name() -> String {
                format!($name_fmt, V::static_type_name())
            }
            fn create_default() -> Self {
                $map::new()
            }
            fn register_converters(registry: &crate::registry::ConverterRegistry) {
                registry.add($converter::<V>::new());
                registry.ensure_registered::<V>();
            }
        }

        pub struct $converter<V: Reflectable> {
            type_name: String,
            _marker: PhantomData<fn() -> V>,
        }

        impl<V: Reflectable> $converter<V> {
            pub fn new() -> Arc<Self> {
                Arc::new($converter {
                    type_name: $map::<String, V>::static_type_name(),
                    _marker: PhantomData,
                })
            }
        }

        impl<V: Reflectable> Converter for $converter<V> {
            fn name(&self) -> &'static str {
                "map"
            }

            fn target_type_name(&self) -> &str {
                &self.type_name
            }

            fn serialize_value(
                &self,
                engine: &dyn Engine,
                value: &dyn Reflect,
                depth: usize,
                diags: &mut Diagnostics,
            ) -> Result<SerializedMember> {
                if depth > MAX_DEPTH {
                    return Err(Error::DepthExceeded(self.type_name.clone(), MAX_DEPTH));
                }
                let map = value
                    .as_any()
                    .downcast_ref::<$map<String, V>>()
                    .expect("map converter dispatched to a value of a different type");
                let mut object = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    let env = engine.serialize_dyn(v, &V::static_type_name(), depth + 1, diags)?;
                    object.insert(k.clone(), serde_json::to_value(&env)?);
                }
                Ok(SerializedMember::scalar(self.type_name.clone(), Json::Object(object)))
            }

            fn deserialize_value(
                &self,
                engine: &dyn Engine,
                envelope: &SerializedMember,
                target_type: &str,
                depth: usize,
                diags: &mut Diagnostics,
                mut ctx: Option<&mut InstanceContext>,
            ) -> Result<Box<dyn Reflect>> {
                if envelope.is_null() {
                    return Ok(Box::new($map::<String, V>::new()));
                }
                let json = envelope.value_json_element.clone().unwrap_or(Json::Null);
                let obj = json
                    .as_object()
                    .ok_or_else(|| Error::coercion_failed(target_type, "expected a JSON object"))?;
                let mut out = $map::new();
                for (key, value_json) in obj {
                    let child_env: SerializedMember = serde_json::from_value(value_json.clone())?;
                    let value = engine.deserialize_dyn(
                        &child_env,
                        &V::static_type_name(),
                        depth + 1,
                        diags,
                        reborrow_ctx(&mut ctx),
                    )?;
                    let typed = value
                        .as_any()
                        .downcast_ref::<V>()
                        .cloned()
                        .ok_or_else(|| Error::TypeMismatch {
                            expected: V::static_type_name(),
                            actual: value.type_name(),
                        })?;
                    out.insert(key.clone(), typed);
                }
                Ok(Box::new(out))
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
                match replacement.as_any().downcast_ref::<$map<String, V>>() {
                    Some(v) => match target.as_any_mut().downcast_mut::<$map<String, V>>() {
                        Some(slot) => {
                            *slot = v.clone();
                            Ok(true)
                        }
                        None => Ok(false),
                    },
                    None => Ok(false),
                }
            }
        }
    };
}

impl_map!(HashMap, "HashMap<String, {}>", HashMapConverter);
impl_map!(BTreeMap, "BTreeMap<String, {}>", BTreeMapConverter);

// -- Tuples, arity 1-7 ---------------------
//
// Arity >= 8 is expressed by nesting a tuple in the final component
// (`(A, B, C, D, E, F, G, (H, I))`) rather than a bespoke `Rest` field —
// every arity up to 7 already implements `Reflectable`, so the nested
// tuple satisfies the last type parameter with no special case needed.

macro_rules! impl_tuple {
    ($converter:ident ; $( $idx:tt : $T:ident ),+) => {
        impl<$($T: Reflectable),+> Reflect for ($($T,)+) {
            fn type_name(&self) -> String {
                format!("({})", [$($T::static_type_name()),+].join(", "))
            }
            fn as_any(&self) -> &dyn Any { self }
            fn as_any_mut(&mut self) -> &mut dyn Any { self }
            fn clone_boxed(&self) -> Box<dyn Reflect> { Box::new(self.clone()) }
            fn reflect_kind(&self) -> ReflectKind { ReflectKind::Tuple }
            fn elements(&self) -> Option<Vec<Box<dyn Reflect>>> {
                Some(vec![ $( Box::new(self.$idx.clone()) as Box<dyn Reflect> ),+ ])
            }
        }

        impl<$($T: Reflectable),+> Reflectable for ($($T,)+) {
            fn static_type_name() -> String {
                format!("({})", [$($T::static_type_name()),+].join(", "))
            }
            fn create_default() -> Self {
                ( $( $T::create_default(), )+ )
            }
            fn register_converters(registry: &crate::registry::ConverterRegistry) {
                registry.add($converter::<$($T),+>::new());
                $( registry.ensure_registered::<$T>(); )+
            }
        }

        pub struct $converter<$($T: Reflectable),+> {
            type_name: String,
            _marker: PhantomData<fn() -> ($($T,)+)>,
        }

        impl<$($T: Reflectable),+> $converter<$($T),+> {
            pub fn new() -> Arc<Self> {
                Arc::new($converter {
                    type_name: <($($T,)+)>::static_type_name(),
                    _marker: PhantomData,
                })
            }
        }

        impl<$($T: Reflectable),+> Converter for $converter<$($T),+> {
            fn name(&self) -> &'static str { "tuple" }

            fn target_type_name(&self) -> &str { &self.type_name }

            fn serialize_value(
                &self,
                engine: &dyn Engine,
                value: &dyn Reflect,
                depth: usize,
                diags: &mut Diagnostics,
            ) -> Result<SerializedMember> {
                if depth > MAX_DEPTH {
                    return Err(Error::DepthExceeded(self.type_name.clone(), MAX_DEPTH));
                }
                let tuple = value
                    .as_any()
                    .downcast_ref::<($($T,)+)>()
                    .expect("tuple converter dispatched to a value of a different type");
                let mut items = Vec::new();
                $(
                    let env = engine.serialize_dyn(&tuple.$idx, &$T::static_type_name(), depth + 1, diags)?;
                    items.push(serde_json::to_value(&env)?);
                )+
                Ok(SerializedMember::scalar(self.type_name.clone(), Json::Array(items)))
            }

            fn deserialize_value(
                &self,
                engine: &dyn Engine,
                envelope: &SerializedMember,
                target_type: &str,
                depth: usize,
                diags: &mut Diagnostics,
                mut ctx: Option<&mut InstanceContext>,
            ) -> Result<Box<dyn Reflect>> {
                let json = envelope.value_json_element.clone().unwrap_or(Json::Null);
                let arr = json
                    .as_array()
                    .ok_or_else(|| Error::coercion_failed(target_type, "expected a JSON array"))?;
                let expected_arity = [$( stringify!($idx) ),+].len();
                if arr.len() != expected_arity {
                    return Err(Error::coercion_failed(
                        target_type,
                        format!("expected {expected_arity} elements, found {}", arr.len()),
                    ));
                }
                let mut iter = arr.iter();
                $(
                    let item_json = iter.next().expect("length checked above");
                    let child_env: SerializedMember = serde_json::from_value(item_json.clone())?;
                    let value = engine.deserialize_dyn(
                        &child_env,
                        &$T::static_type_name(),
                        depth + 1,
                        diags,
                        reborrow_ctx(&mut ctx),
                    )?;
                    let $T = value
                        .as_any()
                        .downcast_ref::<$T>()
                        .cloned()
                        .ok_or_else(|| Error::TypeMismatch {
                            expected: $T::static_type_name(),
                            actual: value.type_name(),
                        })?;
                )+
                Ok(Box::new(( $( $T, )+ )))
            }

            /// Reference tuples are populate-lossy:
            /// there is no addressable slot to write into per component
            /// without a full replace, so populate always replaces whole.
            fn populate_value(
                &self,
                engine: &dyn Engine,
                target: &mut dyn Reflect,
                envelope: &SerializedMember,
                depth: usize,
                diags: &mut Diagnostics,
            ) -> Result<bool> {
                let replacement = self.deserialize_value(engine, envelope, &self.type_name, depth, diags, None)?;
                match replacement.as_any().downcast_ref::<($($T,)+)>() {
                    Some(v) => match target.as_any_mut().downcast_mut::<($($T,)+)>() {
                        Some(slot) => {
                            *slot = v.clone();
                            Ok(true)
                        }
                        None => Ok(false),
                    },
                    None => Ok(false),
                }
            }
        }
    };
}

impl_tuple!(Tuple1Converter; 0:A);
impl_tuple!(Tuple2Converter; 0:A, 1:B);
impl_tuple!(Tuple3Converter; 0:A, 1:B, 2:C);
impl_tuple!(Tuple4Converter; 0:A, 1:B, 2:C, 3:D);
impl_tuple!(Tuple5Converter; 0:A, 1:B, 2:C, 3:D, 4:E);
impl_tuple!(Tuple6Converter; 0:A, 1:B, 2:C, 3:D, 4:E, 5:F);
impl_tuple!(Tuple7Converter; 0:A, 1:B, 2:C, 3:D, 4:E, 5:F, 6:G);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Serializer;

    #[test]
    fn nullable_converter_serializes_none_as_null_envelope() {
        let s = Serializer::new();
        let (env, _) = s.serialize::<Option<i32>>(&None).unwrap();
        assert!(env.is_null());
        assert_eq!(env.type_name.as_deref(), Some("Option<i32>"));
    }

    #[test]
    fn nullable_converter_round_trips_some_value() {
        let s = Serializer::new();
        let (env, _) = s.serialize::<Option<i32>>(&Some(7)).unwrap();
        let (back, _) = s.deserialize::<Option<i32>>(&env).unwrap();
        assert_eq!(back, Some(7));
    }

    #[test]
    fn nullable_populate_clears_existing_value_on_null() {
        let s = Serializer::new();
        let mut target = Some(5);
        let envelope = SerializedMember::null("Option<i32>");
        let (ok, _) = s.populate(&mut target, &envelope).unwrap();
        assert!(ok);
        assert_eq!(target, None);
    }

    #[test]
    fn list_converter_round_trips_vec() {
        let s = Serializer::new();
        let v = vec![1, 2, 3];
        let (env, _) = s.serialize::<Vec<i32>>(&v).unwrap();
        let (back, _) = s.deserialize::<Vec<i32>>(&env).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn list_converter_deserialize_rejects_non_array_payload() {
        let s = Serializer::new();
        s.register::<Vec<i32>>();
        let envelope = SerializedMember::scalar("Vec<i32>", Json::from(5));
        let result: Result<(Vec<i32>, _)> = s.deserialize(&envelope);
        assert!(result.is_err());
    }

    #[test]
    fn hash_set_round_trips_unique_elements() {
        let s = Serializer::new();
        let mut v: HashSet<i32> = HashSet::new();
        v.insert(1);
        v.insert(2);
        let (env, _) = s.serialize::<HashSet<i32>>(&v).unwrap();
        let (back, _) = s.deserialize::<HashSet<i32>>(&env).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn btree_set_and_hash_set_have_distinct_type_ids() {
        assert_ne!(HashSet::<i32>::static_type_name(), BTreeSet::<i32>::static_type_name());
    }

    #[test]
    fn hash_map_round_trips_string_keyed_entries() {
        let s = Serializer::new();
        let mut v: HashMap<String, i32> = HashMap::new();
        v.insert("a".to_string(), 1);
        v.insert("b".to_string(), 2);
        let (env, _) = s.serialize::<HashMap<String, i32>>(&v).unwrap();
        let (back, _) = s.deserialize::<HashMap<String, i32>>(&env).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn hash_map_serializes_as_a_json_object_keyed_by_the_string_key() {
        let s = Serializer::new();
        let mut v: HashMap<String, i32> = HashMap::new();
        v.insert("a".to_string(), 1);
        let (env, _) = s.serialize::<HashMap<String, i32>>(&v).unwrap();
        let obj = env.value_json_element.as_ref().unwrap().as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key("a"));
    }

    #[test]
    fn btree_map_round_trips_string_keyed_entries() {
        let s = Serializer::new();
        let mut v: BTreeMap<String, i32> = BTreeMap::new();
        v.insert("a".to_string(), 1);
        let (env, _) = s.serialize::<BTreeMap<String, i32>>(&v).unwrap();
        let (back, _) = s.deserialize::<BTreeMap<String, i32>>(&env).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn tuple_round_trips_heterogeneous_elements() {
        let s = Serializer::new();
        let v: (i32, String, bool) = (1, "x".to_string(), true);
        let (env, _) = s.serialize::<(i32, String, bool)>(&v).unwrap();
        let (back, _) = s.deserialize::<(i32, String, bool)>(&env).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn tuple_deserialize_rejects_wrong_arity() {
        let s = Serializer::new();
        s.register::<(i32, i32)>();
        let envelope = SerializedMember::scalar("(i32, i32)", Json::from(vec![1]));
        let result: Result<((i32, i32), _)> = s.deserialize(&envelope);
        assert!(result.is_err());
    }

    #[test]
    fn tuple_populate_replaces_the_whole_value_rather_than_one_slot() {
        let s = Serializer::new();
        let mut target: (i32, i32) = (1, 2);
        let (env, _) = s.serialize::<(i32, i32)>(&(9, 9)).unwrap();
        let (ok, _) = s.populate(&mut target, &env).unwrap();
        assert!(ok);
        assert_eq!(target, (9, 9));
    }

    #[test]
    fn registering_a_vec_auto_registers_its_element_wrapper_type() {
        let s = Serializer::new();
        s.register::<Vec<Option<i32>>>();
        // `Vec<Option<i32>>::register_converters` recurses into
        // `Option<i32>::register_converters` without a separate call.
        let chain = s.registry().chain("Option<i32>");
        assert!(!chain.is_empty());
    }
}
