//! Typed field access.
//!
//! Each persisted field is reached through a getter/setter pair of plain
//! function pointers captured when the schema is built. [`FieldType`] converts
//! the field's Rust type to and from a [`Value`].

use crate::error::{MappingError, MappingResult};
use crate::relation::{Relation, ResolvedCache};
use crate::schema::{schema_of, Model};
use crate::mapper;
use datamap_types::{Key, Record, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// The declared kind of a field's Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    /// Enumerated type persisted as its label.
    Enum,
    /// Structured document persisted as its JSON string form.
    Document,
    Relation,
}

/// A Rust type that can be stored in a mapped field.
///
/// Implemented for the primitive types, `String`, `Vec<u8>`, [`Json`], and
/// `Option<F>` of any of them. Enumerated types implement it with
/// `KIND = FieldKind::Enum` and convert through [`Value::Label`].
///
/// Non-optional primitives read a stored null as their default value.
pub trait FieldType: Sized + 'static {
    const KIND: FieldKind;

    fn to_value(&self) -> Result<Value, String>;

    fn from_value(value: Value) -> Result<Self, String>;
}

fn unexpected(expected: &str, got: &Value) -> String {
    format!("expected {expected}, got {}", got.type_name())
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_value(&self) -> Result<Value, String> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(unexpected("bool", &other)),
        }
    }
}

impl FieldType for i64 {
    const KIND: FieldKind = FieldKind::Int;

    fn to_value(&self) -> Result<Value, String> {
        Ok(Value::Int(*self))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Int(n) => Ok(n),
            Value::Null => Ok(0),
            other => Err(unexpected("int", &other)),
        }
    }
}

impl FieldType for i32 {
    const KIND: FieldKind = FieldKind::Int;

    fn to_value(&self) -> Result<Value, String> {
        Ok(Value::Int(i64::from(*self)))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Int(n) => Self::try_from(n).map_err(|e| e.to_string()),
            Value::Null => Ok(0),
            other => Err(unexpected("int", &other)),
        }
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_value(&self) -> Result<Value, String> {
        Ok(Value::Float(*self))
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(n) => Ok(n as f64),
            Value::Null => Ok(0.0),
            other => Err(unexpected("float", &other)),
        }
    }
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_value(&self) -> Result<Value, String> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) | Value::Label(s) => Ok(s),
            Value::Null => Ok(Self::new()),
            other => Err(unexpected("text", &other)),
        }
    }
}

impl FieldType for Vec<u8> {
    const KIND: FieldKind = FieldKind::Bytes;

    fn to_value(&self) -> Result<Value, String> {
        Ok(Value::Bytes(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Null => Ok(Self::new()),
            other => Err(unexpected("bytes", &other)),
        }
    }
}

impl<F: FieldType> FieldType for Option<F> {
    const KIND: FieldKind = F::KIND;

    fn to_value(&self) -> Result<Value, String> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => F::from_value(other).map(Some),
        }
    }
}

/// A structured document field, persisted as JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<D>(pub D);

impl<D> Deref for Json<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.0
    }
}

impl<D> DerefMut for Json<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.0
    }
}

impl<D: Serialize + DeserializeOwned + 'static> FieldType for Json<D> {
    const KIND: FieldKind = FieldKind::Document;

    fn to_value(&self) -> Result<Value, String> {
        serde_json::to_value(&self.0)
            .map(Value::Document)
            .map_err(|e| e.to_string())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Document(doc) => serde_json::from_value(doc).map(Json).map_err(|e| e.to_string()),
            Value::Text(s) => serde_json::from_str(&s).map(Json).map_err(|e| e.to_string()),
            other => Err(unexpected("document", &other)),
        }
    }
}

// ── Accessors ────────────────────────────────────────────────────

/// Reads and writes one plain (non-relationship) field of `T`.
pub trait ValueAccessor<T>: Send + Sync {
    fn read(&self, obj: &T) -> Result<Value, String>;

    fn write(&self, obj: &mut T, value: Value) -> Result<(), String>;
}

pub(crate) struct ValueField<T, F> {
    pub(crate) get: fn(&T) -> &F,
    pub(crate) get_mut: fn(&mut T) -> &mut F,
}

impl<T: 'static, F: FieldType> ValueAccessor<T> for ValueField<T, F> {
    fn read(&self, obj: &T) -> Result<Value, String> {
        (self.get)(obj).to_value()
    }

    fn write(&self, obj: &mut T, value: Value) -> Result<(), String> {
        *(self.get_mut)(obj) = F::from_value(value)?;
        Ok(())
    }
}

/// Reads and writes one relationship field of `T`.
///
/// The target type is erased so a schema can hold relations to different
/// model types side by side.
pub trait RelationAccessor<T>: Send + Sync {
    /// Kind (table name) of the referenced model.
    fn target_kind(&self) -> MappingResult<&'static str>;

    /// Key of the current reference, or `None` when the field is empty.
    fn reference(&self, obj: &T) -> MappingResult<Option<Key>>;

    /// Replaces the field with an unresolved reference (or clears it).
    fn set_reference(&self, obj: &mut T, key: Option<Key>);

    fn is_resolved(&self, obj: &T) -> bool;

    /// Resolves the field from a fetched record, reusing an instance already
    /// in `cache` for the same key. Empty fields are left untouched.
    fn resolve(
        &self,
        obj: &mut T,
        record: Option<&Record>,
        cache: &mut ResolvedCache,
    ) -> MappingResult<()>;
}

pub(crate) struct RelationField<T, U> {
    pub(crate) name: String,
    pub(crate) get: fn(&T) -> &Option<Relation<U>>,
    pub(crate) get_mut: fn(&mut T) -> &mut Option<Relation<U>>,
}

impl<T: 'static, U: Model> RelationAccessor<T> for RelationField<T, U> {
    fn target_kind(&self) -> MappingResult<&'static str> {
        Ok(schema_of::<U>()?.kind())
    }

    fn reference(&self, obj: &T) -> MappingResult<Option<Key>> {
        (self.get)(obj).as_ref().map(Relation::key).transpose()
    }

    fn set_reference(&self, obj: &mut T, key: Option<Key>) {
        *(self.get_mut)(obj) = key.map(Relation::Unresolved);
    }

    fn is_resolved(&self, obj: &T) -> bool {
        (self.get)(obj).as_ref().is_some_and(Relation::is_resolved)
    }

    fn resolve(
        &self,
        obj: &mut T,
        record: Option<&Record>,
        cache: &mut ResolvedCache,
    ) -> MappingResult<()> {
        let Some(key) = self.reference(obj)? else {
            return Ok(());
        };
        let shared = match cache.get::<U>(&key) {
            Some(found) => found,
            None => {
                let record = record.ok_or_else(|| {
                    MappingError::access(&self.name, format!("no record fetched for {key}"))
                })?;
                let target: U = mapper::from_record(schema_of::<U>()?, record)?;
                let shared = Arc::new(target);
                cache.insert(key, Arc::clone(&shared));
                shared
            }
        };
        *(self.get_mut)(obj) = Some(Relation::Resolved(shared));
        Ok(())
    }
}
