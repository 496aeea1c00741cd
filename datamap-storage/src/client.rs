//! Store client abstraction.

use crate::error::StorageResult;
use crate::query::NativeQuery;
use datamap_types::{Key, Record};
use std::collections::HashMap;

/// The primitive operations the mapping engine issues against a store.
///
/// Implementations own their connection and are shared across threads; join
/// passes may call [`get_many`](Self::get_many) concurrently.
pub trait StoreClient: Send + Sync {
    /// Writes one record, replacing any record under the same key.
    ///
    /// Returns the key the record was stored under. For an incomplete key
    /// this carries the identifier the store assigned.
    fn put(&self, record: Record) -> StorageResult<Key>;

    /// Reads one record. Fails with `NotFound` when the key is absent.
    fn get(&self, key: &Key) -> StorageResult<Record>;

    /// Removes one record. Removing an absent key is not an error.
    fn delete(&self, key: &Key) -> StorageResult<()>;

    /// Reads several records at once. Absent keys are left out of the map.
    fn get_many(&self, keys: &[Key]) -> StorageResult<HashMap<Key, Record>>;

    /// Removes several records at once.
    fn delete_many(&self, keys: &[Key]) -> StorageResult<()>;

    /// Runs a query and returns matching records in query order, skipping
    /// `offset` matches and returning at most `limit`.
    fn execute(
        &self,
        query: &NativeQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> StorageResult<Vec<Record>>;

    /// Counts matching records, stopping at `limit` when given.
    fn count(&self, query: &NativeQuery, limit: Option<usize>) -> StorageResult<usize>;
}

impl<S: StoreClient + ?Sized> StoreClient for std::sync::Arc<S> {
    fn put(&self, record: Record) -> StorageResult<Key> {
        (**self).put(record)
    }

    fn get(&self, key: &Key) -> StorageResult<Record> {
        (**self).get(key)
    }

    fn delete(&self, key: &Key) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn get_many(&self, keys: &[Key]) -> StorageResult<HashMap<Key, Record>> {
        (**self).get_many(keys)
    }

    fn delete_many(&self, keys: &[Key]) -> StorageResult<()> {
        (**self).delete_many(keys)
    }

    fn execute(
        &self,
        query: &NativeQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> StorageResult<Vec<Record>> {
        (**self).execute(query, limit, offset)
    }

    fn count(&self, query: &NativeQuery, limit: Option<usize>) -> StorageResult<usize> {
        (**self).count(query, limit)
    }
}
