//! In-process key-value store.

use crate::client::StoreClient;
use crate::error::{StorageError, StorageResult};
use crate::query::NativeQuery;
use datamap_types::{Key, KeyId, Record};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Key-value store held in memory.
///
/// Records are grouped per kind in key order. Each kind has its own id
/// allocator: a record put under an incomplete key gets the next number
/// above every numeric id seen so far for that kind. Once `i64::MAX` has been
/// used, puts under incomplete keys of that kind fail.
#[derive(Default)]
pub struct MemoryStore {
    kinds: RwLock<HashMap<String, KindTable>>,
}

#[derive(Default)]
struct KindTable {
    rows: BTreeMap<KeyId, Record>,
    last_id: i64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored under `kind`.
    pub fn record_count(&self, kind: &str) -> StorageResult<usize> {
        Ok(self.read()?.get(kind).map_or(0, |t| t.rows.len()))
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<String, KindTable>>> {
        self.kinds.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<String, KindTable>>> {
        self.kinds.write().map_err(|_| StorageError::Poisoned)
    }
}

impl StoreClient for MemoryStore {
    fn put(&self, mut record: Record) -> StorageResult<Key> {
        let mut kinds = self.write()?;
        let table = kinds.entry(record.key().kind().to_string()).or_default();
        let key = match record.key().id() {
            KeyId::Incomplete => {
                table.last_id = table.last_id.checked_add(1).ok_or_else(|| {
                    StorageError::Backend(format!(
                        "id space exhausted for kind '{}'",
                        record.key().kind()
                    ))
                })?;
                let key = record.key().complete_with(table.last_id);
                record.set_key(key.clone());
                key
            }
            KeyId::Id(id) => {
                table.last_id = table.last_id.max(*id);
                record.key().clone()
            }
            KeyId::Name(_) => record.key().clone(),
        };
        debug!(key = %key, properties = record.len(), "Stored record");
        table.rows.insert(key.id().clone(), record);
        Ok(key)
    }

    fn get(&self, key: &Key) -> StorageResult<Record> {
        self.read()?
            .get(key.kind())
            .and_then(|t| t.rows.get(key.id()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.clone()))
    }

    fn delete(&self, key: &Key) -> StorageResult<()> {
        let removed = self
            .write()?
            .get_mut(key.kind())
            .and_then(|t| t.rows.remove(key.id()))
            .is_some();
        debug!(key = %key, removed, "Deleted record");
        Ok(())
    }

    fn get_many(&self, keys: &[Key]) -> StorageResult<HashMap<Key, Record>> {
        let kinds = self.read()?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                kinds
                    .get(key.kind())
                    .and_then(|t| t.rows.get(key.id()))
                    .map(|record| (key.clone(), record.clone()))
            })
            .collect())
    }

    fn delete_many(&self, keys: &[Key]) -> StorageResult<()> {
        let mut kinds = self.write()?;
        let mut removed = 0usize;
        for key in keys {
            if let Some(table) = kinds.get_mut(key.kind()) {
                removed += usize::from(table.rows.remove(key.id()).is_some());
            }
        }
        debug!(requested = keys.len(), removed, "Deleted records");
        Ok(())
    }

    fn execute(
        &self,
        query: &NativeQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> StorageResult<Vec<Record>> {
        let kinds = self.read()?;
        let Some(table) = kinds.get(query.kind()) else {
            return Ok(Vec::new());
        };
        let records = query.select(table.rows.values(), limit, offset);
        debug!(
            kind = query.kind(),
            filters = query.filters().len(),
            sorts = query.sorts().len(),
            returned = records.len(),
            "Executed query"
        );
        Ok(records)
    }

    fn count(&self, query: &NativeQuery, limit: Option<usize>) -> StorageResult<usize> {
        let kinds = self.read()?;
        Ok(kinds
            .get(query.kind())
            .map_or(0, |t| query.count_matching(t.rows.values(), limit)))
    }
}
