//! Error types for object mapping.

use thiserror::Error;

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Errors that can occur while mapping objects to records and back.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The identity field holds no usable value where one is required.
    #[error("identity field '{field}' of kind '{kind}' has no value")]
    MissingIdentity { kind: String, field: String },

    /// The schema declares a key-generation mode the engine cannot handle.
    #[error("id generator {0} is not supported")]
    UnsupportedIdGenerator(String),

    /// An identity or filter value cannot be coerced to the required form.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Reading or writing a field on an object failed.
    #[error("field '{field}' access error: {reason}")]
    Access { field: String, reason: String },

    /// A query or join names a field the schema does not declare.
    #[error("unknown field '{field}' on kind '{kind}'")]
    UnknownField { kind: String, field: String },

    /// The schema declaration is inconsistent.
    #[error("invalid schema for kind '{kind}': {reason}")]
    InvalidSchema { kind: String, reason: String },

    /// A key could not be constructed.
    #[error("key error: {0}")]
    Key(#[from] datamap_types::Error),
}

impl MappingError {
    pub(crate) fn access(field: &str, reason: impl Into<String>) -> Self {
        Self::Access {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
