//! Per-type schemas.
//!
//! A [`Model`] describes itself once through a [`SchemaBuilder`]. The built
//! [`Schema`] is cached process-wide by type and never invalidated; callers
//! that need a different layout at runtime must restart the process.

use crate::error::{MappingError, MappingResult};
use crate::field::{FieldKind, FieldType, RelationAccessor, RelationField, ValueAccessor, ValueField};
use crate::relation::Relation;
use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};
use tracing::debug;

/// A typed object that can be persisted.
///
/// New instances are created through `Default` before their fields are
/// populated from a record.
///
/// ```ignore
/// impl Model for Scientist {
///     fn describe() -> SchemaBuilder<Self> {
///         Self::schema("scientists")
///             .id("id", IdGenerator::AutoIncrement, |s| &s.id, |s| &mut s.id)
///             .field("name", |s| &s.name, |s| &mut s.name)
///     }
/// }
/// ```
pub trait Model: Default + Send + Sync + 'static {
    /// Declares the kind name, identity field and persisted fields.
    fn describe() -> SchemaBuilder<Self>;

    /// Starts a declaration for kind `kind`. Field accessor closures passed
    /// to the returned builder have their object type fixed to `Self`.
    #[must_use]
    fn schema(kind: &str) -> SchemaBuilder<Self> {
        SchemaBuilder::new(kind)
    }
}

/// How a kind's record keys are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdGenerator {
    /// The caller sets the identity before insert; it becomes the key name.
    Assigned,
    /// The store allocates a numeric id on insert.
    AutoIncrement,
    /// A random UUID is generated client-side before insert.
    Uuid,
    /// A named database sequence. Declarable, but no store adapter supports it.
    Sequence(String),
}

impl fmt::Display for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned => f.write_str("assigned"),
            Self::AutoIncrement => f.write_str("auto_increment"),
            Self::Uuid => f.write_str("uuid"),
            Self::Sequence(name) => write!(f, "sequence({name})"),
        }
    }
}

/// Capability flags of one persisted field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    pub relation: bool,
    pub unindexed: bool,
    pub document: bool,
    pub enumerated: bool,
}

/// How a field is reached on an object.
pub enum FieldAccess<T> {
    Value(Box<dyn ValueAccessor<T>>),
    Relation(Box<dyn RelationAccessor<T>>),
}

/// One persisted field.
pub struct FieldSchema<T> {
    name: String,
    column: String,
    kind: FieldKind,
    flags: FieldFlags,
    access: FieldAccess<T>,
}

impl<T> FieldSchema<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column name in the store.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub const fn flags(&self) -> FieldFlags {
        self.flags
    }

    #[must_use]
    pub const fn access(&self) -> &FieldAccess<T> {
        &self.access
    }

    #[must_use]
    pub const fn is_relation(&self) -> bool {
        self.flags.relation
    }

    /// The relationship accessor, for relationship fields.
    #[must_use]
    pub fn relation(&self) -> Option<&dyn RelationAccessor<T>> {
        match &self.access {
            FieldAccess::Relation(accessor) => Some(accessor.as_ref()),
            FieldAccess::Value(_) => None,
        }
    }
}

impl<T> fmt::Debug for FieldSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// The identity field. It is persisted as the record key, not as a column.
pub struct IdentityField<T> {
    name: String,
    kind: FieldKind,
    generator: IdGenerator,
    access: Box<dyn ValueAccessor<T>>,
}

impl<T> IdentityField<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind, either `Int` or `Text`.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub const fn generator(&self) -> &IdGenerator {
        &self.generator
    }

    #[must_use]
    pub fn accessor(&self) -> &dyn ValueAccessor<T> {
        self.access.as_ref()
    }
}

impl<T> fmt::Debug for IdentityField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityField")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping metadata for one model type.
pub struct Schema<T> {
    kind: String,
    identity: IdentityField<T>,
    fields: Vec<FieldSchema<T>>,
    joined: Vec<usize>,
}

impl<T> Schema<T> {
    /// Kind (table or collection name).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub const fn identity(&self) -> &IdentityField<T> {
        &self.identity
    }

    /// Persisted fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema<T>] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema<T>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a persisted field, failing with `UnknownField`.
    pub fn require_field(&self, name: &str) -> MappingResult<&FieldSchema<T>> {
        self.field(name).ok_or_else(|| MappingError::UnknownField {
            kind: self.kind.clone(),
            field: name.to_string(),
        })
    }

    #[must_use]
    pub fn is_identity(&self, name: &str) -> bool {
        self.identity.name == name
    }

    /// Relationship fields that every fetch resolves.
    pub fn joined_fields(&self) -> impl Iterator<Item = &FieldSchema<T>> {
        self.joined.iter().map(|&i| &self.fields[i])
    }

    #[must_use]
    pub fn has_joined_fields(&self) -> bool {
        !self.joined.is_empty()
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.kind)
            .field("identity", &self.identity)
            .field("fields", &self.fields)
            .field("joined", &self.joined)
            .finish()
    }
}

// ── Builder ──────────────────────────────────────────────────────

/// Declares a model's schema.
///
/// Modifiers such as [`column`](Self::column) and [`unindexed`](Self::unindexed)
/// apply to the most recently declared field. Declaration mistakes are
/// collected and reported together by [`build`](Self::build).
pub struct SchemaBuilder<T> {
    kind: String,
    identity: Vec<IdentityField<T>>,
    fields: Vec<FieldSchema<T>>,
    joined: Vec<usize>,
    problems: Vec<String>,
}

impl<T: 'static> SchemaBuilder<T> {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identity: Vec::new(),
            fields: Vec::new(),
            joined: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// Declares the identity field and its key-generation mode.
    #[must_use]
    pub fn id<F: FieldType>(
        mut self,
        name: &str,
        generator: IdGenerator,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        if !matches!(F::KIND, FieldKind::Int | FieldKind::Text) {
            self.problems
                .push(format!("identity '{name}' must be an integer or text field"));
        }
        self.identity.push(IdentityField {
            name: name.to_string(),
            kind: F::KIND,
            generator,
            access: Box::new(ValueField { get, get_mut }),
        });
        self
    }

    /// Declares a plain field. Document and enumerated flags follow the
    /// field type's [`FieldKind`].
    #[must_use]
    pub fn field<F: FieldType>(
        mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        let flags = FieldFlags {
            document: F::KIND == FieldKind::Document,
            enumerated: F::KIND == FieldKind::Enum,
            ..FieldFlags::default()
        };
        self.fields.push(FieldSchema {
            name: name.to_string(),
            column: name.to_string(),
            kind: F::KIND,
            flags,
            access: FieldAccess::Value(Box::new(ValueField { get, get_mut })),
        });
        self
    }

    /// Declares a one-to-one relationship to another model.
    #[must_use]
    pub fn relation<U: Model>(
        mut self,
        name: &str,
        get: fn(&T) -> &Option<Relation<U>>,
        get_mut: fn(&mut T) -> &mut Option<Relation<U>>,
    ) -> Self {
        self.fields.push(FieldSchema {
            name: name.to_string(),
            column: name.to_string(),
            kind: FieldKind::Relation,
            flags: FieldFlags {
                relation: true,
                ..FieldFlags::default()
            },
            access: FieldAccess::Relation(Box::new(RelationField {
                name: name.to_string(),
                get,
                get_mut,
            })),
        });
        self
    }

    /// Overrides the column name of the last declared field.
    #[must_use]
    pub fn column(mut self, column: &str) -> Self {
        match self.fields.last_mut() {
            Some(field) => field.column = column.to_string(),
            None => self.problems.push(format!("column('{column}') without a field")),
        }
        self
    }

    /// Stores the last declared field without indexing it.
    #[must_use]
    pub fn unindexed(mut self) -> Self {
        match self.fields.last_mut() {
            Some(field) => field.flags.unindexed = true,
            None => self.problems.push("unindexed() without a field".to_string()),
        }
        self
    }

    /// Resolves the last declared relationship on every fetch.
    #[must_use]
    pub fn joined(mut self) -> Self {
        match self.fields.last() {
            Some(field) if field.flags.relation => self.joined.push(self.fields.len() - 1),
            Some(field) => self
                .problems
                .push(format!("joined() on non-relationship field '{}'", field.name)),
            None => self.problems.push("joined() without a field".to_string()),
        }
        self
    }

    /// Validates the declaration.
    pub fn build(mut self) -> MappingResult<Schema<T>> {
        if self.kind.is_empty() {
            self.problems.push("kind must not be empty".to_string());
        }
        if self.identity.len() != 1 {
            self.problems.push(format!(
                "expected exactly one identity field, found {}",
                self.identity.len()
            ));
        }
        let mut columns = HashSet::new();
        for field in &self.fields {
            if !columns.insert(field.column.as_str()) {
                self.problems
                    .push(format!("duplicate column '{}'", field.column));
            }
            if self.identity.iter().any(|id| id.name == field.name) {
                self.problems
                    .push(format!("field '{}' is also the identity", field.name));
            }
        }

        match self.identity.pop() {
            Some(identity) if self.problems.is_empty() => Ok(Schema {
                kind: self.kind,
                identity,
                fields: self.fields,
                joined: self.joined,
            }),
            _ => Err(MappingError::InvalidSchema {
                kind: self.kind,
                reason: self.problems.join("; "),
            }),
        }
    }
}

// ── Process-wide cache ───────────────────────────────────────────

type Registry = RwLock<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>;

static SCHEMAS: OnceLock<Registry> = OnceLock::new();

/// Returns the cached schema for `T`, building it on first use.
///
/// Two threads racing on the same type may both build; the first insert wins
/// and the other result is dropped. Built schemas live for the rest of the
/// process. A failed build is not cached.
pub fn schema_of<T: Model>() -> MappingResult<&'static Schema<T>> {
    let registry = SCHEMAS.get_or_init(Registry::default);
    let type_id = TypeId::of::<T>();

    let cached = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .copied();
    if let Some(entry) = cached {
        return downcast(entry);
    }

    let built = T::describe().build()?;
    debug!(kind = %built.kind(), fields = built.fields().len(), "Schema cached");

    let mut schemas = registry.write().unwrap_or_else(PoisonError::into_inner);
    let entry = match schemas.entry(type_id) {
        Entry::Occupied(existing) => *existing.get(),
        Entry::Vacant(slot) => {
            let leaked: &'static Schema<T> = Box::leak(Box::new(built));
            *slot.insert(leaked)
        }
    };
    downcast(entry)
}

fn downcast<T: Model>(entry: &'static (dyn Any + Send + Sync)) -> MappingResult<&'static Schema<T>> {
    entry
        .downcast_ref::<Schema<T>>()
        .ok_or_else(|| MappingError::InvalidSchema {
            kind: std::any::type_name::<T>().to_string(),
            reason: "cached schema has a different type".to_string(),
        })
}
