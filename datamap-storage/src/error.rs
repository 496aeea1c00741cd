//! Error types for the store layer.

use datamap_types::Key;
use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record exists under the key.
    #[error("record not found: {0}")]
    NotFound(Key),

    /// The store cannot allocate an identifier for this key.
    #[error("key {0} has no identifier and this store cannot assign one")]
    IncompleteKey(Key),

    /// The store has no native support for the requested query shape.
    #[error("unsupported by this store: {0}")]
    Unsupported(String),

    /// A cell could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// Failure reported by the underlying store client.
    #[error("backend error: {0}")]
    Backend(String),
}
