//! Object model for datamap.
//!
//! Turns typed Rust objects into store [`Record`](datamap_types::Record)s and
//! back:
//! - [`Model`] / [`Schema`]: per-type field list, columns and flags, built once
//!   and cached for the life of the process
//! - [`keys`]: identity handling for the three key-generation modes
//! - [`codec`]: field value to store value conversion (long text, blob
//!   truncation, labels, documents, references)
//! - [`mapper`]: whole-object conversion built on the two above
//! - [`Relation`]: a relationship field that is either an unresolved key or a
//!   shared, fully mapped object
//!
//! Query translation, joins and the store façade live in `datamap-engine`.

pub mod codec;
mod error;
mod field;
pub mod keys;
pub mod mapper;
mod relation;
mod schema;

pub use error::{MappingError, MappingResult};
pub use field::{FieldKind, FieldType, Json, RelationAccessor, ValueAccessor};
pub use relation::{Relation, ResolvedCache};
pub use schema::{
    schema_of, FieldAccess, FieldFlags, FieldSchema, IdGenerator, IdentityField, Model, Schema,
    SchemaBuilder,
};
