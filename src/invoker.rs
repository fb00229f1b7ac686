//! Method invocation: name/arity/argument-name resolution,
//! argument binding (reusing the same converters that serve serialize and
//! deserialize for coercion), and `async`-capable dispatch.
//!
//! Rust has no reflective method table, so callers register each
//! invocable method explicitly via [`Callable`] — the method-invocation
//! counterpart to [`crate::reflect::reflect_struct!`] standing in for a
//! member-enumeration API the host runtime would otherwise provide.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::Value as Json;

use crate::converter::Engine;
use crate::diagnostics::Diagnostics;
use crate::envelope::SerializedMember;
use crate::error::{Error, Result};
use crate::reflect::Reflect;

/// A method call in flight. Async throughout even for synchronous methods, which simply resolve the
/// future immediately.
pub type InvokeFuture = Pin<Box<dyn Future<Output = Result<Box<dyn Reflect>>> + Send>>;

/// One invocable method on one type. Implementors close over the actual
/// Rust method call; the engine only ever sees this narrow interface.
pub trait Callable: Send + Sync {
    fn name(&self) -> &str;
    fn parameter_names(&self) -> &[&'static str];
    fn parameter_types(&self) -> &[&'static str];
    fn call(&self, receiver: &mut dyn Reflect, args: Vec<Box<dyn Reflect>>) -> InvokeFuture;
}

/// Registered methods, keyed by the declaring type's canonical type-id.
/// Mirrors [`crate::registry::ConverterRegistry`]'s shape (a single
/// `RwLock`-guarded table) but has no priority/blacklist concerns of its
/// own.
#[derive(Default)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, Vec<Arc<dyn Callable>>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, type_name: impl Into<String>, method: Arc<dyn Callable>) {
        self.methods
            .write()
            .expect("method registry poisoned")
            .entry(type_name.into())
            .or_default()
            .push(method);
    }

    /// Resolves the single best overload for `method_name` on `type_name`
    /// given the supplied argument names. Positional calls pass an
    /// all-`None` `arg_names` of the right length.
    pub fn resolve(
        &self,
        type_name: &str,
        method_name: &str,
        arg_names: &[Option<String>],
    ) -> Result<Arc<dyn Callable>> {
        let methods = self.methods.read().expect("method registry poisoned");
        let candidates: Vec<&Arc<dyn Callable>> = methods
            .get(type_name)
            .into_iter()
            .flatten()
            .filter(|m| m.name() == method_name)
            .collect();
        if candidates.is_empty() {
            return Err(Error::MethodResolution(
                method_name.to_string(),
                format!("no method named `{method_name}` on `{type_name}`"),
            ));
        }

        let arity_matches: Vec<&&Arc<dyn Callable>> = candidates
            .iter()
            .filter(|m| m.parameter_names().len() == arg_names.len())
            .collect();
        if arity_matches.is_empty() {
            return Err(Error::MethodResolution(
                method_name.to_string(),
                format!("no overload of `{method_name}` accepts {} argument(s)", arg_names.len()),
            ));
        }

        if arg_names.iter().all(Option::is_none) {
            if arity_matches.len() == 1 {
                return Ok((*arity_matches[0]).clone());
            }
            return Err(Error::MethodResolution(
                method_name.to_string(),
                format!("{} overloads of `{method_name}` match by arity alone; pass argument names", arity_matches.len()),
            ));
        }

        let by_name: Vec<&&Arc<dyn Callable>> = arity_matches
            .iter()
            .copied()
            .filter(|m| {
                arg_names.iter().all(|name| match name {
                    Some(n) => m.parameter_names().contains(&n.as_str()),
                    None => false,
                })
            })
            .collect();
        match by_name.len() {
            1 => Ok((*by_name[0]).clone()),
            0 => Err(Error::MethodResolution(
                method_name.to_string(),
                "no overload accepts the given argument names".to_string(),
            )),
            n => Err(Error::MethodResolution(
                method_name.to_string(),
                format!("{n} overloads match the given argument names equally well"),
            )),
        }
    }
}

/// One caller-supplied argument: an optional name (for named-argument
/// binding) and its raw JSON value.
pub struct Argument {
    pub name: Option<String>,
    pub value: Json,
}

impl Argument {
    pub fn positional(value: Json) -> Self {
        Argument { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Json) -> Self {
        Argument {
            name: Some(name.into()),
            value,
        }
    }
}

/// Resolves, binds, and invokes a method, reusing the full converter
/// chain for argument coercion rather than a separate scalar-only table.
pub async fn invoke(
    engine: &dyn Engine,
    methods: &MethodRegistry,
    receiver: &mut dyn Reflect,
    method_name: &str,
    args: Vec<Argument>,
    diags: &mut Diagnostics,
) -> Result<Box<dyn Reflect>> {
    let type_name = receiver.type_name();
    let arg_names: Vec<Option<String>> = args.iter().map(|a| a.name.clone()).collect();
    let callable = methods.resolve(&type_name, method_name, &arg_names)?;

    let ordered = order_arguments(&callable, args, method_name)?;
    let mut bound = Vec::with_capacity(ordered.len());
    for (param_name, param_type, json) in ordered {
        let envelope = if SerializedMember::payload_is_envelope_shaped(&json) {
            serde_json::from_value(json).map_err(Error::from)?
        } else {
            SerializedMember::scalar(param_type, json)
        };
        let value = engine
            .deserialize_dyn(&envelope, param_type, 0, diags, None)
            .map_err(|e| Error::ArgumentCoercion {
                parameter: param_name.to_string(),
                reason: e.to_string(),
            })?;
        bound.push(value);
    }

    callable.call(receiver, bound).await.map_err(|e| match e {
        Error::InvocationFailure { .. } => e,
        other => Error::InvocationFailure {
            method: method_name.to_string(),
            message: other.to_string(),
        },
    })
}

/// Reorders caller arguments into declared parameter order, filling named
/// arguments by lookup and positional ones by slot.
fn order_arguments(
    callable: &Arc<dyn Callable>,
    args: Vec<Argument>,
    method_name: &str,
) -> Result<Vec<(&'static str, &'static str, Json)>> {
    let names = callable.parameter_names();
    let types = callable.parameter_types();
    let mut slots: Vec<Option<Json>> = vec![None; names.len()];

    for (i, arg) in args.into_iter().enumerate() {
        match arg.name {
            Some(name) => {
                let idx = names.iter().position(|n| *n == name).ok_or_else(|| {
                    Error::ArgumentCoercion {
                        parameter: name.clone(),
                        reason: format!("`{method_name}` has no parameter named `{name}`"),
                    }
                })?;
                slots[idx] = Some(arg.value);
            }
            None => {
                slots[i] = Some(arg.value);
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.map(|json| (names[i], types[i], json)).ok_or_else(|| Error::ArgumentCoercion {
                parameter: names[i].to_string(),
                reason: "missing argument".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Serializer;
    use crate::reflect::{Reflect, Reflectable};
    use std::task::{Context, Poll, Waker};

    /// Polls a future to completion without a runtime, for the rare test
    /// that needs to drive `invoke`'s `async` boundary directly — every
    /// `Callable::call` here resolves on first poll.
    fn block_on<F: Future>(fut: F) -> F::Output {
        let mut fut = std::pin::pin!(fut);
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);
        loop {
            if let Poll::Ready(v) = fut.as_mut().poll(&mut cx) {
                return v;
            }
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: i32,
    }

    crate::reflect_struct! {
        struct Counter {
            value: i32,
        }
    }

    struct AddToValue;

    impl Callable for AddToValue {
        fn name(&self) -> &str {
            "add"
        }
        fn parameter_names(&self) -> &[&'static str] {
            &["amount"]
        }
        fn parameter_types(&self) -> &[&'static str] {
            &["i32"]
        }
        fn call(&self, receiver: &mut dyn Reflect, mut args: Vec<Box<dyn Reflect>>) -> InvokeFuture {
            let amount = *args.remove(0).as_any().downcast_ref::<i32>().unwrap();
            let counter = receiver.as_any_mut().downcast_mut::<Counter>().unwrap();
            counter.value += amount;
            Box::pin(std::future::ready(Ok(Box::new(counter.value) as Box<dyn Reflect>)))
        }
    }

    #[test]
    fn resolve_matches_a_single_overload_by_arity() {
        let registry = MethodRegistry::new();
        registry.register("Counter", Arc::new(AddToValue));
        let found = registry.resolve("Counter", "add", &[None]).unwrap();
        assert_eq!(found.name(), "add");
    }

    #[test]
    fn resolve_fails_when_no_method_of_that_name_exists() {
        let registry = MethodRegistry::new();
        registry.register("Counter", Arc::new(AddToValue));
        assert!(registry.resolve("Counter", "subtract", &[None]).is_err());
    }

    #[test]
    fn resolve_fails_when_arity_does_not_match() {
        let registry = MethodRegistry::new();
        registry.register("Counter", Arc::new(AddToValue));
        assert!(registry.resolve("Counter", "add", &[None, None]).is_err());
    }

    #[test]
    fn resolve_matches_by_named_argument() {
        let registry = MethodRegistry::new();
        registry.register("Counter", Arc::new(AddToValue));
        let found = registry.resolve("Counter", "add", &[Some("amount".to_string())]).unwrap();
        assert_eq!(found.name(), "add");
    }

    #[test]
    fn invoke_binds_a_positional_argument_and_runs_the_method() {
        let s = Serializer::new();
        s.register_method("Counter", Arc::new(AddToValue));
        let mut receiver = Counter { value: 1 };
        let fut = s.invoke(&mut receiver, "add", vec![Argument::positional(Json::from(4))]);
        let (result, _) = block_on(fut).unwrap();
        assert_eq!(*result.as_any().downcast_ref::<i32>().unwrap(), 5);
        assert_eq!(receiver.value, 5);
    }

    #[test]
    fn invoke_reports_unknown_method_as_method_resolution_error() {
        let s = Serializer::new();
        s.register_method("Counter", Arc::new(AddToValue));
        let mut receiver = Counter { value: 1 };
        let fut = s.invoke(&mut receiver, "multiply", vec![Argument::positional(Json::from(2))]);
        let result = block_on(fut);
        assert!(matches!(result, Err(Error::MethodResolution(..))));
    }
}
