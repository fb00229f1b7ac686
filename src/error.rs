//! Error taxonomy for the reflective serialization engine.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Hard errors that abort the current converter call.
///
/// Warnings (`UnsupportedMember`, `GetterRaised`) are not represented
/// here — they never abort a call and are recorded in
/// [`crate::diagnostics::Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A `typeName` (or fallback type) did not resolve to a registered type.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Interface/abstract target with a non-null payload, or constructor
    /// resolution failed entirely.
    #[error("cannot instantiate type `{0}`: {1}")]
    CannotInstantiate(String, String),

    /// `populate` target's runtime type is not assignable to the resolved type.
    #[error("type mismatch: target is `{actual}`, expected `{expected}`")]
    TypeMismatch { expected: String, actual: String },

    /// A leaf converter failed to coerce a JSON value into its target type.
    #[error("failed to coerce value into `{type_name}`: {reason}")]
    CoercionFailed { type_name: String, reason: String },

    /// The method invoker failed to bind one parameter.
    #[error("failed to bind argument `{parameter}`: {reason}")]
    ArgumentCoercion { parameter: String, reason: String },

    /// Method not found, or more than one overload matched equally well.
    #[error("method resolution failed for `{0}`: {1}")]
    MethodResolution(String, String),

    /// The invoked method itself raised.
    #[error("invocation of `{method}` failed: {message}")]
    InvocationFailure { method: String, message: String },

    /// Recursion exceeded `MAX_DEPTH`.
    #[error("depth exceeded while processing `{0}` (max {1})")]
    DepthExceeded(String, usize),

    /// Generic JSON reader/writer failure from the host JSON library.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn cannot_instantiate(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CannotInstantiate(type_name.into(), reason.into())
    }

    pub fn coercion_failed(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CoercionFailed {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
