//! In-process wide-column store.
//!
//! Each kind is a table of rows keyed by the stringified identifier. A row
//! holds one cell per property, qualified by column name and stored as
//! JSON-encoded bytes under a single column family. Queries are answered by
//! scanning the whole table in row-key order.
//!
//! The table has no id allocator, so incomplete keys are rejected, and rows
//! cannot be returned in any order but their own.

use crate::client::StoreClient;
use crate::error::{StorageError, StorageResult};
use crate::query::NativeQuery;
use datamap_types::{Key, Record, StoreValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Column family used when none is given.
pub const DEFAULT_FAMILY: &str = "string";

type Table = BTreeMap<String, Row>;

struct Row {
    key: Key,
    cells: Vec<Cell>,
}

struct Cell {
    family: String,
    qualifier: String,
    bytes: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct CellValue {
    value: StoreValue,
    indexed: bool,
}

/// Wide-column store held in memory.
pub struct ColumnFamilyStore {
    family: String,
    tables: RwLock<HashMap<String, Table>>,
}

impl Default for ColumnFamilyStore {
    fn default() -> Self {
        Self::with_family(DEFAULT_FAMILY)
    }
}

impl ColumnFamilyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose cells live under `family`.
    pub fn with_family(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Raw cell bytes of one column, as the table holds them.
    pub fn raw_cell(&self, key: &Key, column: &str) -> StorageResult<Option<Vec<u8>>> {
        let tables = self.read()?;
        Ok(tables
            .get(key.kind())
            .and_then(|t| t.get(&key.id_string()))
            .and_then(|row| {
                row.cells
                    .iter()
                    .find(|c| c.family == self.family && c.qualifier == column)
            })
            .map(|c| c.bytes.clone()))
    }

    fn encode_row(&self, record: &Record) -> StorageResult<Row> {
        let cells = record
            .properties()
            .map(|p| -> StorageResult<Cell> {
                let bytes = serde_json::to_vec(&CellValue {
                    value: p.value.clone(),
                    indexed: p.indexed,
                })?;
                Ok(Cell {
                    family: self.family.clone(),
                    qualifier: p.name.clone(),
                    bytes,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Row {
            key: record.key().clone(),
            cells,
        })
    }

    fn decode_row(&self, row: &Row) -> StorageResult<Record> {
        let mut record = Record::new(row.key.clone());
        for cell in row.cells.iter().filter(|c| c.family == self.family) {
            let decoded: CellValue = serde_json::from_slice(&cell.bytes)?;
            if decoded.indexed {
                record.set(cell.qualifier.clone(), decoded.value);
            } else {
                record.set_unindexed(cell.qualifier.clone(), decoded.value);
            }
        }
        Ok(record)
    }

    fn scan(&self, kind: &str) -> StorageResult<Vec<Record>> {
        let tables = self.read()?;
        tables
            .get(kind)
            .map_or_else(|| Ok(Vec::new()), |t| t.values().map(|row| self.decode_row(row)).collect())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<String, Table>>> {
        self.tables.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<String, Table>>> {
        self.tables.write().map_err(|_| StorageError::Poisoned)
    }
}

impl StoreClient for ColumnFamilyStore {
    fn put(&self, record: Record) -> StorageResult<Key> {
        let key = record.key().clone();
        if !key.is_complete() {
            return Err(StorageError::IncompleteKey(key));
        }
        let row = self.encode_row(&record)?;
        debug!(key = %key, family = %self.family, cells = row.cells.len(), "Stored row");
        self.write()?
            .entry(key.kind().to_string())
            .or_default()
            .insert(key.id_string(), row);
        Ok(key)
    }

    fn get(&self, key: &Key) -> StorageResult<Record> {
        let tables = self.read()?;
        let row = tables
            .get(key.kind())
            .and_then(|t| t.get(&key.id_string()))
            .ok_or_else(|| StorageError::NotFound(key.clone()))?;
        self.decode_row(row)
    }

    fn delete(&self, key: &Key) -> StorageResult<()> {
        if let Some(table) = self.write()?.get_mut(key.kind()) {
            table.remove(&key.id_string());
        }
        debug!(key = %key, "Deleted row");
        Ok(())
    }

    fn get_many(&self, keys: &[Key]) -> StorageResult<HashMap<Key, Record>> {
        let tables = self.read()?;
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(row) = tables.get(key.kind()).and_then(|t| t.get(&key.id_string())) {
                found.insert(key.clone(), self.decode_row(row)?);
            }
        }
        Ok(found)
    }

    fn delete_many(&self, keys: &[Key]) -> StorageResult<()> {
        let mut tables = self.write()?;
        for key in keys {
            if let Some(table) = tables.get_mut(key.kind()) {
                table.remove(&key.id_string());
            }
        }
        debug!(rows = keys.len(), "Deleted rows");
        Ok(())
    }

    fn execute(
        &self,
        query: &NativeQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> StorageResult<Vec<Record>> {
        if !query.sorts().is_empty() {
            return Err(StorageError::Unsupported(format!(
                "sort orders on '{}': rows are only scanned in row-key order",
                query.kind()
            )));
        }
        let rows = self.scan(query.kind())?;
        let records = query.select(&rows, limit, offset);
        debug!(
            kind = query.kind(),
            scanned = rows.len(),
            returned = records.len(),
            "Scanned table"
        );
        Ok(records)
    }

    fn count(&self, query: &NativeQuery, limit: Option<usize>) -> StorageResult<usize> {
        let rows = self.scan(query.kind())?;
        Ok(query.count_matching(&rows, limit))
    }
}
