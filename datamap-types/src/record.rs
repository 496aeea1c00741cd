//! Store records.

use crate::{Key, StoreValue};
use serde::{Deserialize, Serialize};

/// One named column of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: StoreValue,
    /// Whether the store should index this column. Unindexed columns are
    /// persisted but cannot be filtered or sorted on.
    pub indexed: bool,
}

/// The store-native form of one object: a key plus ordered properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    key: Key,
    properties: Vec<Property>,
}

impl Record {
    /// Creates an empty record for the given key.
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.key
    }

    /// Replaces the key. Stores use this to complete an incomplete key.
    pub fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    /// Sets an indexed property, replacing any property with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: StoreValue) {
        self.put_property(name.into(), value, true);
    }

    /// Sets a property the store must not index.
    pub fn set_unindexed(&mut self, name: impl Into<String>, value: StoreValue) {
        self.put_property(name.into(), value, false);
    }

    fn put_property(&mut self, name: String, value: StoreValue, indexed: bool) {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                existing.value = value;
                existing.indexed = indexed;
            }
            None => self.properties.push(Property {
                name,
                value,
                indexed,
            }),
        }
    }

    /// Returns the value of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StoreValue> {
        self.property(name).map(|p| &p.value)
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties in the order they were set.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns a copy holding only the key, as a keys-only query returns.
    #[must_use]
    pub fn keys_only(&self) -> Self {
        Self::new(self.key.clone())
    }
}
