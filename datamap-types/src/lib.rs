//! Store-native type definitions for datamap.
//!
//! This crate defines the types shared by the mapping engine and every store
//! adapter:
//! - [`Key`]: a (kind, identifier) pair addressing one record
//! - [`StoreValue`]: the restricted set of value kinds a store persists
//! - [`Record`]: a key plus an ordered list of named properties
//! - [`Value`]: the typed, in-memory form of a single object field
//!
//! Nothing here knows about schemas or objects; that belongs to `datamap-model`.

mod key;
mod record;
mod value;

pub use key::{Key, KeyId};
pub use record::{Property, Record};
pub use value::{StoreValue, Value};

/// Strings longer than this many characters are persisted as long text.
pub const LONG_TEXT_THRESHOLD: usize = 500;

/// Binary payloads are truncated to this many bytes before persisting.
pub const MAX_BLOB_BYTES: usize = 1_000_000;

/// Reserved column name that addresses a record's key in filters and sorts.
pub const KEY_COLUMN: &str = "__key__";

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("key name for kind '{kind}' must not be empty")]
    EmptyKeyName { kind: String },

    #[error("key kind must not be empty")]
    EmptyKind,
}
