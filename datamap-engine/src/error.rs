//! Error types for the engine.

use datamap_model::MappingError;
use datamap_storage::StorageError;
use datamap_types::Key;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by [`Manager`](crate::Manager) operations.
///
/// Every error is fatal to the operation that raised it. Nothing is retried
/// and records written earlier in the same call stay written.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A filter names an operator outside the supported table.
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    /// The query asks for something the store cannot do natively.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The bulk fetch behind a join failed or came back incomplete.
    #[error("join on field '{field}' failed: {reason}")]
    JoinFetch { field: String, reason: String },

    /// No record exists for the object's key.
    #[error("no record for key {0}")]
    NotFound(Key),

    #[error("store error: {0}")]
    Store(#[from] StorageError),
}
