//! Error types for the conversion engine.
//!
//! All load and store failures surface as [`ConvertError`]. Errors propagate
//! unchanged to the top-level caller; the only place that catches and
//! continues is union matching, which collects per-member failures and
//! aggregates them into [`ConvertError::UnionExhausted`].

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while loading a dynamic value into a typed value or
/// storing a typed value back into a dynamic one.
///
/// These are programming or schema-mismatch errors, never transient
/// failures; nothing in the engine retries.
#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    /// The dynamic value's kind or structure disagrees with what a matched
    /// converter expected. `can_load` checks shape compatibility, not value
    /// well-formedness, so this can fire even after a successful match.
    #[error("shape mismatch: expected {expected}, found {actual}")]
    #[diagnostic(code(recast::shape_mismatch))]
    ShapeMismatch { expected: String, actual: String },

    /// No registered loader accepted the shape.
    #[error("no loader registered for shape {shape}")]
    #[diagnostic(
        code(recast::no_loader),
        help("Register a converter that handles this shape, or extend the default registry with `with_loader`.")
    )]
    NoLoader { shape: String },

    /// No registered store converter accepted the value's runtime tag.
    #[error("no store converter registered for value of kind {kind}")]
    #[diagnostic(
        code(recast::no_store),
        help("Register a converter that handles this value kind, or extend the default registry with `with_store`.")
    )]
    NoStore { kind: String },

    /// A generic type-parameter placeholder has no bound concrete shape in
    /// the current context.
    #[error("unbound generic parameter {name}")]
    #[diagnostic(
        code(recast::unbound_param),
        help("Generic parameters are bound by the enclosing record instantiation; load this shape through a record that instantiates {name}.")
    )]
    UnboundParam { name: String },

    /// A textual forward reference could not be resolved: either no
    /// enclosing record is known, or the name is missing from the enclosing
    /// record's declaring scope.
    #[error("unresolved forward reference {name} (scope: {scope})")]
    #[diagnostic(code(recast::unresolved_ref))]
    UnresolvedRef { name: String, scope: String },

    /// Record field check failed. Both the missing and the unexpected side
    /// of the symmetric difference are reported together.
    #[error("field mismatch for record {record}: missing {missing:?}, unexpected {unexpected:?}")]
    #[diagnostic(code(recast::field_mismatch))]
    FieldMismatch {
        record: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Every member shape of a union failed; the individual failures are
    /// attached as related diagnostics in declaration order.
    #[error("union exhausted: no member shape accepted value of kind {actual}")]
    #[diagnostic(code(recast::union_exhausted))]
    UnionExhausted {
        actual: String,
        #[related]
        attempts: Vec<ConvertError>,
    },

    /// Input sequence is shorter than the declared tuple arity.
    #[error("too few items for tuple: expected {expected}, found {found}")]
    #[diagnostic(code(recast::tuple_arity))]
    TupleArity { expected: usize, found: usize },

    /// A suspending (deferred) result was produced under a context that
    /// forbids suspension.
    #[error("async converter produced a deferred result in a sync-only context")]
    #[diagnostic(
        code(recast::async_in_sync),
        help("Use the async entry point (`from_json_async`) when any converter in the registry may suspend.")
    )]
    AsyncInSyncContext,

    /// A conversion was attempted through a context whose dispatch root was
    /// never bound.
    #[error("conversion context has no bound root converter")]
    #[diagnostic(code(recast::unbound_context))]
    UnboundContext,

    /// A user-supplied codec for a custom shape failed.
    #[error("codec {name}: {message}")]
    #[diagnostic(code(recast::codec))]
    Codec { name: String, message: String },
}

impl ConvertError {
    /// Shape-mismatch constructor from a rendered expectation and the
    /// observed dynamic value.
    pub fn mismatch(expected: impl ToString, value: &serde_json::Value) -> Self {
        ConvertError::ShapeMismatch {
            expected: expected.to_string(),
            actual: crate::value::json_kind(value).to_string(),
        }
    }

    /// Codec-failure constructor.
    pub fn codec(name: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Codec {
            name: name.into(),
            message: message.into(),
        }
    }
}
