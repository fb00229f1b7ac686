//! Reflective JSON serialization, in-place population, and method
//! invocation over an introspectable object model.
//!
//! The engine has no compile-time knowledge of the types it serializes.
//! Every type opts in by implementing [`reflect::Reflect`] (dynamic
//! introspection) and, where a fresh instance is needed,
//! [`reflect::Reflectable`] (static construction) — either by hand, via
//! [`reflect_struct!`] for plain structs, or via [`reflect_enum!`] for
//! C-like enums. A [`facade::Serializer`] owns the converter registry
//! and is the single entry point callers use.

pub mod collections;
pub mod converter;
pub mod diagnostics;
pub mod enums;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod invoker;
pub mod leaves;
pub mod reflect;
pub mod registry;
pub mod type_id;

pub use converter::{Converter, Engine, InstanceContext};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use envelope::SerializedMember;
pub use error::{Error, Result};
pub use facade::{Serializer, SerializerOptions};
pub use invoker::{Argument, Callable, MethodRegistry};
pub use reflect::{Reflect, ReflectKind, Reflectable};
pub use registry::ConverterRegistry;
pub use type_id::{peel_nullable, TypeGraph, TypeKind};
