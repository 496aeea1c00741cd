//! Store layer for datamap.
//!
//! The mapping engine talks to a store only through [`StoreClient`], a narrow
//! set of record-level primitives plus one query primitive taking a
//! [`NativeQuery`]. Two in-process adapters implement it:
//!
//! - [`MemoryStore`]: a key-value store with store-assigned numeric ids,
//!   indexed filtering and sorting
//! - [`ColumnFamilyStore`]: a wide-column table of rows keyed by the
//!   stringified identifier, cells held as encoded bytes in one column family
//!
//! Network-backed stores implement the same trait outside this crate.

mod client;
mod column_family;
mod error;
mod memory;
mod query;

pub use client::StoreClient;
pub use column_family::{ColumnFamilyStore, DEFAULT_FAMILY};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use query::{FilterOp, NativeFilter, NativeQuery, NativeSort, Operand, SortDirection};
