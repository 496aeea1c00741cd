#![allow(dead_code)]

use datamap_engine::{Manager, ManagerConfig};
use datamap_model::{FieldKind, FieldType, IdGenerator, Json, Model, Relation, SchemaBuilder};
use datamap_storage::{MemoryStore, NativeQuery, StorageError, StorageResult, StoreClient};
use datamap_types::{Key, Record, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Models ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scientist {
    pub id: Option<i64>,
    pub name: String,
    pub field: String,
}

impl Model for Scientist {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("scientists")
            .id("id", IdGenerator::AutoIncrement, |s| &s.id, |s| &mut s.id)
            .field("name", |s| &s.name, |s| &mut s.name)
            .field("field", |s| &s.field, |s| &mut s.field)
    }
}

impl Scientist {
    pub fn named(name: &str, field: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub id: Option<i64>,
    pub name: String,
    pub year: i64,
    pub discoverer: Option<Relation<Scientist>>,
    pub reviewer: Option<Relation<Scientist>>,
}

impl Model for Discovery {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("discoveries")
            .id("id", IdGenerator::AutoIncrement, |d| &d.id, |d| &mut d.id)
            .field("name", |d| &d.name, |d| &mut d.name)
            .field("year", |d| &d.year, |d| &mut d.year)
            .relation("discoverer", |d| &d.discoverer, |d| &mut d.discoverer)
            .relation("reviewer", |d| &d.reviewer, |d| &mut d.reviewer)
    }
}

impl Discovery {
    pub fn by(name: &str, year: i64, discoverer: &Scientist) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            year,
            discoverer: Some(Relation::new(discoverer.clone())),
            reviewer: None,
        }
    }
}

/// Its head is resolved on every fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lab {
    pub id: Option<i64>,
    pub name: String,
    pub head: Option<Relation<Scientist>>,
}

impl Model for Lab {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("labs")
            .id("id", IdGenerator::AutoIncrement, |l| &l.id, |l| &mut l.id)
            .field("name", |l| &l.name, |l| &mut l.name)
            .relation("head", |l| &l.head, |l| &mut l.head)
            .joined()
    }
}

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

impl Person {
    pub fn new(login: &str, first_name: &str, age: i64) -> Self {
        Self {
            login: Some(login.to_string()),
            first_name: first_name.to_string(),
            age,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Draft,
    Published,
}

impl FieldType for Status {
    const KIND: FieldKind = FieldKind::Enum;

    fn to_value(&self) -> Result<Value, String> {
        Ok(Value::Label(
            match self {
                Self::Draft => "DRAFT",
                Self::Published => "PUBLISHED",
            }
            .to_string(),
        ))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Label(s) | Value::Text(s) if s == "DRAFT" => Ok(Self::Draft),
            Value::Label(s) | Value::Text(s) if s == "PUBLISHED" => Ok(Self::Published),
            Value::Null => Ok(Self::default()),
            other => Err(format!("not a status: {other:?}")),
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
    pub status: Status,
    pub meta: Option<Json<Meta>>,
    pub attachment: Vec<u8>,
}

impl Model for Article {
    fn describe() -> SchemaBuilder<Self> {
        Self::schema("articles")
            .id("id", IdGenerator::Uuid, |a| &a.id, |a| &mut a.id)
            .field("title", |a| &a.title, |a| &mut a.title)
            .field("body", |a| &a.body, |a| &mut a.body)
            .unindexed()
            .field("status", |a| &a.status, |a| &mut a.status)
            .field("meta", |a| &a.meta, |a| &mut a.meta)
            .field("attachment", |a| &a.attachment, |a| &mut a.attachment)
    }
}

/// Auto-increment identity held as a string.
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

// ── Store wrapper ────────────────────────────────────────────────

/// Memory store that records every call made through it.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<&'static str>>,
    bulk_gets: Mutex<Vec<Vec<Key>>>,
    fail_bulk_gets: AtomicBool,
}

impl CountingStore {
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_of(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    /// Keys requested by each `get_many`, in call order.
    pub fn bulk_gets(&self) -> Vec<Vec<Key>> {
        self.bulk_gets.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
        self.bulk_gets.lock().unwrap().clear();
    }

    pub fn fail_bulk_gets(&self) {
        self.fail_bulk_gets.store(true, Ordering::SeqCst);
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }
}

impl StoreClient for CountingStore {
    fn put(&self, record: Record) -> StorageResult<Key> {
        self.record("put");
        self.inner.put(record)
    }

    fn get(&self, key: &Key) -> StorageResult<Record> {
        self.record("get");
        self.inner.get(key)
    }

    fn delete(&self, key: &Key) -> StorageResult<()> {
        self.record("delete");
        self.inner.delete(key)
    }

    fn get_many(&self, keys: &[Key]) -> StorageResult<HashMap<Key, Record>> {
        self.record("get_many");
        self.bulk_gets.lock().unwrap().push(keys.to_vec());
        if self.fail_bulk_gets.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("connection reset".into()));
        }
        self.inner.get_many(keys)
    }

    fn delete_many(&self, keys: &[Key]) -> StorageResult<()> {
        self.record("delete_many");
        self.inner.delete_many(keys)
    }

    fn execute(
        &self,
        query: &NativeQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> StorageResult<Vec<Record>> {
        self.record("execute");
        self.inner.execute(query, limit, offset)
    }

    fn count(&self, query: &NativeQuery, limit: Option<usize>) -> StorageResult<usize> {
        self.record("count");
        self.inner.count(query, limit)
    }
}

pub fn manager() -> Manager<CountingStore> {
    init_tracing();
    Manager::new(CountingStore::default())
}

pub fn manager_with(config: ManagerConfig) -> Manager<CountingStore> {
    init_tracing();
    Manager::with_config(CountingStore::default(), config)
}

/// Inserts Marie and Pierre plus four discoveries; returns the scientists.
pub fn seed_discoveries(manager: &Manager<CountingStore>) -> (Scientist, Scientist) {
    let mut marie = Scientist::named("Marie", "physics");
    let mut pierre = Scientist::named("Pierre", "physics");
    manager.insert(&mut marie).unwrap();
    manager.insert(&mut pierre).unwrap();
    for (name, year, who) in [
        ("Polonium", 1898, &marie),
        ("Radium", 1898, &marie),
        ("Piezoelectricity", 1880, &pierre),
        ("Curie's law", 1895, &pierre),
    ] {
        manager.insert(&mut Discovery::by(name, year, who)).unwrap();
    }
    manager.store().reset();
    (marie, pierre)
}
