//! Error handling for graphstate operations.
//!
//! This module defines the error types used throughout the crate. All
//! public APIs return `Result<T, MutationError>` for consistent error
//! handling.
//!
//! # Error Types
//!
//! - [`MutationError`] - Main error enum with variants for each failure class
//! - [`Result`] - Result type alias for convenience
//!
//! # Failure Classes
//!
//! Validation and cast failures are always detected before any store
//! interaction and are fully recoverable: fix the input and retry.
//! Store failures are operation-level; the statement and bindings were
//! known-good, and the diagnostic is reproducible. Abend failures mean
//! the session state can no longer be trusted and the run must stop.

use thiserror::Error;

/// Result type for graphstate operations.
///
/// All public APIs return `Result<T, MutationError>` for error handling.
pub type Result<T> = std::result::Result<T, MutationError>;

/// Errors that can occur while compiling or executing graph mutations.
#[derive(Debug, Error)]
pub enum MutationError {
    /// An identifier or entity name failed its required pattern.
    ///
    /// Raised before any templating occurs. Identifiers are embedded
    /// directly in statement text, so the pattern is the injection
    /// boundary; entity names are bound as parameters and the pattern
    /// only rejects control characters and unexpected punctuation.
    #[error("value '{value}' must match pattern {pattern}")]
    Validation {
        /// The offending input value.
        value: String,
        /// The pattern the value failed to match.
        pattern: String,
    },

    /// An edge `unique_key` does not reference a declared property.
    ///
    /// The unique key's bound value is reused from the property binding,
    /// so it must name a real, already-cast property.
    #[error("unique_key '{key}' not found in properties")]
    UniqueKeyNotFound {
        /// The key that is missing from the property map.
        key: String,
    },

    /// A property entry is not a `{value, type}` structure.
    ///
    /// Structural errors are distinct from cast errors: the entry could
    /// not even be inspected for a value to convert.
    #[error("property '{key}': {reason}")]
    MalformedProperty {
        /// The offending property key.
        key: String,
        /// What was wrong with the entry's shape.
        reason: String,
    },

    /// A property value could not be converted to its declared type.
    #[error("failed to cast property '{key}' with value '{value}' to type '{target}': {reason}")]
    Cast {
        /// The offending property key.
        key: String,
        /// Display form of the raw value.
        value: String,
        /// The declared target type.
        target: String,
        /// Underlying conversion failure.
        reason: String,
    },

    /// The backing store completed the call but reported a domain failure.
    ///
    /// The statement and bindings are known-good at this point; the caller
    /// receives both for reproduction alongside this diagnostic.
    #[error("store error{}: {message}", fmt_code(.code))]
    Store {
        /// Store-assigned error code, when one was reported.
        code: Option<String>,
        /// Store-reported failure message.
        message: String,
    },

    /// Any execution failure other than a recognized store error.
    ///
    /// Treated as catastrophic: the statement buffer may be in an
    /// inconsistent state, so the run aborts with no further items
    /// attempted and no automatic retry.
    #[error("unexpected failure: {0}")]
    Abend(String),
}

impl MutationError {
    /// True for failures detected before any store interaction.
    pub fn is_local(&self) -> bool {
        !matches!(self, MutationError::Store { .. } | MutationError::Abend(_))
    }
}

fn fmt_code(code: &Option<String>) -> String {
    match code {
        Some(c) => format!(" [{c}]"),
        None => String::new(),
    }
}
