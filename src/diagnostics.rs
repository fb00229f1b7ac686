//! Per-call diagnostics buffer.
//!
//! Warnings never abort a call. They accumulate here so a caller can
//! inspect what was swallowed (a throwing getter, an unknown member name
//! named in an envelope) without the call itself failing.

use tracing::warn;

/// One non-fatal event recorded during serialize/deserialize/populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A field or property named in an envelope has no counterpart on the
    /// target type. Carries the names that *were* available so the
    /// caller can diagnose typos.
    UnsupportedMember {
        type_name: String,
        member_name: String,
        available: Vec<String>,
    },
    /// A property or field getter raised during serialize; the member was
    /// omitted from the envelope instead of aborting the whole call.
    GetterRaised {
        type_name: String,
        member_name: String,
        message: String,
    },
    /// A read-only property named in an envelope was skipped during populate.
    ReadOnlyMember {
        type_name: String,
        member_name: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnsupportedMember {
                type_name,
                member_name,
                available,
            } => write!(
                f,
                "`{member_name}` is not a member of `{type_name}` (available: {})",
                available.join(", ")
            ),
            Diagnostic::GetterRaised {
                type_name,
                member_name,
                message,
            } => write!(f, "getter `{type_name}.{member_name}` raised: {message}"),
            Diagnostic::ReadOnlyMember {
                type_name,
                member_name,
            } => write!(f, "`{type_name}.{member_name}` is read-only, skipped"),
        }
    }
}

/// Accumulates diagnostics for a single top-level serialize / deserialize /
/// populate call. Never shared across calls — construct one per call on
/// the caller's stack.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and mirrors it to the `tracing` warn level so
    /// it surfaces in process logs even if the caller discards the buffer.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(%diagnostic, "reflective_json diagnostic");
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
