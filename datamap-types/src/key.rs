//! Record keys.
//!
//! A key is the pair (kind, identifier). The kind is the table or collection
//! name; the identifier is either a caller-chosen name, a store-assigned
//! number, or absent until the store allocates one.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier part of a [`Key`].
///
/// Variant order defines key ordering within a kind: incomplete keys first,
/// then numeric ids, then names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyId {
    /// No identifier yet; the store assigns a numeric id on `put`.
    Incomplete,
    /// Store-assigned numeric identifier.
    Id(i64),
    /// Caller-assigned or client-generated string identifier.
    Name(String),
}

/// Address of one record in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    kind: String,
    id: KeyId,
}

impl Key {
    /// Creates a key with a string identifier. Empty names are rejected.
    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let kind = non_empty_kind(kind.into())?;
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyKeyName { kind });
        }
        Ok(Self {
            kind,
            id: KeyId::Name(name),
        })
    }

    /// Creates a key with a numeric identifier.
    pub fn with_id(kind: impl Into<String>, id: i64) -> Result<Self> {
        Ok(Self {
            kind: non_empty_kind(kind.into())?,
            id: KeyId::Id(id),
        })
    }

    /// Creates a key whose identifier the store will allocate.
    pub fn incomplete(kind: impl Into<String>) -> Result<Self> {
        Ok(Self {
            kind: non_empty_kind(kind.into())?,
            id: KeyId::Incomplete,
        })
    }

    /// Returns the kind (table name) this key belongs to.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the identifier part.
    #[must_use]
    pub const fn id(&self) -> &KeyId {
        &self.id
    }

    /// Returns the string identifier, if this key has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.id {
            KeyId::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the numeric identifier, if this key has one.
    #[must_use]
    pub const fn numeric_id(&self) -> Option<i64> {
        match self.id {
            KeyId::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Whether the key carries an identifier.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        !matches!(self.id, KeyId::Incomplete)
    }

    /// Returns a copy of this key with the given numeric id.
    #[must_use]
    pub fn complete_with(&self, id: i64) -> Self {
        Self {
            kind: self.kind.clone(),
            id: KeyId::Id(id),
        }
    }

    /// The identifier rendered as a string (used as a row key by
    /// wide-column stores). Incomplete keys render as an empty string.
    #[must_use]
    pub fn id_string(&self) -> String {
        match &self.id {
            KeyId::Incomplete => String::new(),
            KeyId::Id(id) => id.to_string(),
            KeyId::Name(name) => name.clone(),
        }
    }
}

fn non_empty_kind(kind: String) -> Result<String> {
    if kind.is_empty() {
        Err(Error::EmptyKind)
    } else {
        Ok(kind)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            KeyId::Incomplete => write!(f, "{}(?)", self.kind),
            KeyId::Id(id) => write!(f, "{}({})", self.kind, id),
            KeyId::Name(name) => write!(f, "{}(\"{}\")", self.kind, name),
        }
    }
}
