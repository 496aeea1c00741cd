//! Mapping engine for datamap.
//!
//! [`Manager`] sequences the model layer and a [`StoreClient`] for every
//! public operation: single-object insert, update, get and delete, plus
//! query-driven fetch, keys-only fetch, lazy iteration, count and delete.
//!
//! Queries are described with [`Query`] in terms of object fields and
//! translated to a [`NativeQuery`](datamap_storage::NativeQuery) over record
//! columns. Relationship fields named in a join (or declared as always
//! joined) are resolved by [`JoinResolver`] with one bulk fetch per field.

mod config;
mod error;
mod join;
mod manager;
mod query;
pub mod translate;

pub use config::ManagerConfig;
pub use datamap_storage::StoreClient;
pub use error::{EngineError, EngineResult};
pub use join::JoinResolver;
pub use manager::{Manager, QueryIter};
pub use query::{Filter, Join, Operand, Order, Query};
