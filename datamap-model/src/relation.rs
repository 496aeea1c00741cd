//! Relationship values.
//!
//! A relationship field holds `Option<Relation<U>>`. Reading a record yields
//! `Relation::Unresolved(key)`; a join pass replaces it with
//! `Relation::Resolved` pointing at a fully mapped object. Objects resolved in
//! the same pass share one `Arc` per key.

use crate::error::MappingResult;
use crate::schema::{schema_of, Model};
use crate::{keys, mapper};
use datamap_types::Key;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A reference to another mapped object.
#[derive(Debug)]
pub enum Relation<U> {
    /// Only the key is known; the target has not been joined.
    Unresolved(Key),
    /// The target has been fetched and mapped.
    Resolved(Arc<U>),
}

impl<U> Clone for Relation<U> {
    fn clone(&self) -> Self {
        match self {
            Self::Unresolved(key) => Self::Unresolved(key.clone()),
            Self::Resolved(target) => Self::Resolved(Arc::clone(target)),
        }
    }
}

impl<U: PartialEq> PartialEq for Relation<U> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unresolved(a), Self::Unresolved(b)) => a == b,
            (Self::Resolved(a), Self::Resolved(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl<U> Relation<U> {
    /// Wraps an object as a resolved reference.
    #[must_use]
    pub fn new(target: U) -> Self {
        Self::Resolved(Arc::new(target))
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The target object, once resolved.
    #[must_use]
    pub fn get(&self) -> Option<&U> {
        match self {
            Self::Resolved(target) => Some(target),
            Self::Unresolved(_) => None,
        }
    }

    /// The shared target, once resolved.
    #[must_use]
    pub const fn shared(&self) -> Option<&Arc<U>> {
        match self {
            Self::Resolved(target) => Some(target),
            Self::Unresolved(_) => None,
        }
    }
}

impl<U: Model> Relation<U> {
    /// Key of the referenced record. For a resolved target this is derived
    /// from the target's identity field.
    pub fn key(&self) -> MappingResult<Key> {
        match self {
            Self::Unresolved(key) => Ok(key.clone()),
            Self::Resolved(target) => keys::key_of(schema_of::<U>()?, target),
        }
    }

    /// Builds a default target carrying only its identity.
    pub fn to_stub(&self) -> MappingResult<U> {
        let key = self.key()?;
        mapper::from_key(schema_of::<U>()?, &key)
    }
}

/// Objects already mapped during one join pass, keyed by record key.
#[derive(Default)]
pub struct ResolvedCache {
    entries: HashMap<Key, Arc<dyn Any + Send + Sync>>,
}

impl ResolvedCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared instance for `key` if one of type `U` was cached.
    #[must_use]
    pub fn get<U: Send + Sync + 'static>(&self, key: &Key) -> Option<Arc<U>> {
        self.entries
            .get(key)
            .and_then(|entry| Arc::clone(entry).downcast::<U>().ok())
    }

    pub fn insert<U: Send + Sync + 'static>(&mut self, key: Key, target: Arc<U>) {
        self.entries.insert(key, target);
    }

    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResolvedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
