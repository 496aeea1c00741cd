#![allow(dead_code)]

use datamap_model::{FieldKind, FieldType, IdGenerator, Json, Model, Relation, SchemaBuilder};
use datamap_types::Value;
use serde::{Deserialize, Serialize};

// ── Assigned identity ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub login: Option<String>,
    pub first_name: String,
    pub age: i64,
}

impl Model for Person {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("people")
            .id("login", IdGenerator::Assigned, |p| &p.login, |p| &mut p.login)
            .field("first_name", |p| &p.first_name, |p| &mut p.first_name)
            .column("firstName")
            .field("age", |p| &p.age, |p| &mut p.age)
    }
}

// ── Auto-increment identity ──────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scientist {
    pub id: Option<i64>,
    pub name: String,
}

impl Model for Scientist {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("scientists")
            .id("id", IdGenerator::AutoIncrement, |s| &s.id, |s| &mut s.id)
            .field("name", |s| &s.name, |s| &mut s.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub id: Option<i64>,
    pub name: String,
    pub discoverer: Option<Relation<Scientist>>,
}

impl Model for Discovery {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("discoveries")
            .id("id", IdGenerator::AutoIncrement, |d| &d.id, |d| &mut d.id)
            .field("name", |d| &d.name, |d| &mut d.name)
            .relation("discoverer", |d| &d.discoverer, |d| &mut d.discoverer)
    }
}

/// Auto-increment identity declared as a string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ticket {
    pub id: Option<String>,
    pub title: String,
}

impl Model for Ticket {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("tickets")
            .id("id", IdGenerator::AutoIncrement, |t| &t.id, |t| &mut t.id)
            .field("title", |t| &t.title, |t| &mut t.title)
    }
}

// ── UUID identity ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Draft,
    Published,
}

impl FieldType for Status {
    const KIND: FieldKind = FieldKind::Enum;

    fn to_value(&self) -> Result<Value, String> {
        let label = match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
        };
        Ok(Value::Label(label.to_string()))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Label(s) | Value::Text(s) => match s.as_str() {
                "DRAFT" => Ok(Self::Draft),
                "PUBLISHED" => Ok(Self::Published),
                other => Err(format!("unknown status '{other}'")),
            },
            Value::Null => Ok(Self::default()),
            other => Err(format!("expected label, got {}", other.type_name())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub tags: Vec<String>,
    pub rating: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub id: Option<String>,
    pub title: String,
    pub body: String,
    pub attachment: Vec<u8>,
    pub status: Status,
    pub meta: Option<Json<Meta>>,
    pub score: f64,
    pub pinned: bool,
}

impl Model for Article {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("articles")
            .id("id", IdGenerator::Uuid, |a| &a.id, |a| &mut a.id)
            .field("title", |a| &a.title, |a| &mut a.title)
            .field("body", |a| &a.body, |a| &mut a.body)
            .unindexed()
            .field("attachment", |a| &a.attachment, |a| &mut a.attachment)
            .field("status", |a| &a.status, |a| &mut a.status)
            .field("meta", |a| &a.meta, |a| &mut a.meta)
            .field("score", |a| &a.score, |a| &mut a.score)
            .field("pinned", |a| &a.pinned, |a| &mut a.pinned)
    }
}

// ── Unsupported generator ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequenced {
    pub id: Option<i64>,
}

impl Model for Sequenced {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("sequenced").id(
            "id",
            IdGenerator::Sequence("seq_orders".to_string()),
            |s| &s.id,
            |s| &mut s.id,
        )
    }
}
