//! The manager façade.

use crate::config::ManagerConfig;
use crate::error::{EngineError, EngineResult};
use crate::join::JoinResolver;
use crate::query::{Join, Query};
use crate::translate::{self, OPERATORS};
use datamap_model::{keys, mapper, schema_of, MappingResult, Model, Schema};
use datamap_storage::{StorageError, StoreClient};
use datamap_types::{Key, Record};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Maps objects of any [`Model`] type to and from one store.
///
/// The manager owns the store handle for its lifetime. It holds no other
/// mutable state; calls may be made from several threads at once when the
/// store allows it.
pub struct Manager<S> {
    store: S,
    config: ManagerConfig,
}

impl<S: StoreClient> Manager<S> {
    /// Creates a manager with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ManagerConfig::default())
    }

    pub fn with_config(store: S, config: ManagerConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Operators accepted in query filters.
    #[must_use]
    pub fn supported_operators(&self) -> Vec<&'static str> {
        OPERATORS.iter().map(|(symbol, _)| *symbol).collect()
    }

    // ── Single objects ───────────────────────────────────────────

    /// Writes a new object and stores its final key back into the identity
    /// field. Returns that key.
    pub fn insert<T: Model>(&self, obj: &mut T) -> EngineResult<Key> {
        let schema = schema_of::<T>()?;
        let record = mapper::insert_record(schema, obj)?;
        let key = self.store.put(record)?;
        keys::apply_key(schema, obj, &key)?;
        debug!(key = %key, "Inserted object");
        Ok(key)
    }

    /// Overwrites the record under the object's current identity.
    ///
    /// There is no version check: the last write wins.
    pub fn update<T: Model>(&self, obj: &T) -> EngineResult<()> {
        let schema = schema_of::<T>()?;
        let record = mapper::update_record(schema, obj)?;
        let key = self.store.put(record)?;
        debug!(key = %key, "Updated object");
        Ok(())
    }

    /// Reloads every persisted field of `obj` from the store. Relationship
    /// fields come back unresolved.
    pub fn get<T: Model>(&self, obj: &mut T) -> EngineResult<()> {
        let schema = schema_of::<T>()?;
        let key = keys::key_of(schema, obj)?;
        let record = self.store.get(&key).map_err(|e| match e {
            StorageError::NotFound(key) => EngineError::NotFound(key),
            other => other.into(),
        })?;
        mapper::populate(schema, obj, &record)?;
        Ok(())
    }

    pub fn delete<T: Model>(&self, obj: &T) -> EngineResult<()> {
        let schema = schema_of::<T>()?;
        let key = keys::key_of(schema, obj)?;
        self.store.delete(&key)?;
        debug!(key = %key, "Deleted object");
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Fetches and maps the matching objects, then resolves joins.
    ///
    /// Advances the query's next offset to `offset` plus the number of
    /// objects returned. Without a `limit` the configured default applies.
    pub fn fetch<T: Model>(
        &self,
        query: &mut Query<T>,
        limit: Option<usize>,
        offset: usize,
    ) -> EngineResult<Vec<T>> {
        let schema = schema_of::<T>()?;
        let native = translate::translate(schema, query)?;
        let records = self
            .store
            .execute(&native, limit.or(self.config.default_fetch_limit), offset)?;
        let mut objects = map_records(schema, &records)?;
        query.set_next_offset(offset + objects.len());

        if needs_joins(schema, query.joins()) {
            self.resolver().resolve(schema, &mut objects, query.joins())?;
        }
        debug!(kind = schema.kind(), fetched = objects.len(), offset, "Fetched objects");
        Ok(objects)
    }

    /// Like [`fetch`](Self::fetch), but only identities are loaded: every
    /// other field keeps its default and no join runs.
    pub fn fetch_keys<T: Model>(
        &self,
        query: &mut Query<T>,
        limit: Option<usize>,
        offset: usize,
    ) -> EngineResult<Vec<T>> {
        let schema = schema_of::<T>()?;
        let native = translate::translate(schema, query)?.keys_only();
        let records = self
            .store
            .execute(&native, limit.or(self.config.default_fetch_limit), offset)?;
        let objects = records
            .iter()
            .map(|r| mapper::from_record_keys_only(schema, r))
            .collect::<MappingResult<Vec<T>>>()?;
        query.set_next_offset(offset + objects.len());
        Ok(objects)
    }

    /// Iterates the matching objects, mapping them as they are pulled.
    ///
    /// When joins are needed objects are mapped and joined
    /// `iter_batch_size` at a time.
    pub fn iter<T: Model>(
        &self,
        query: &Query<T>,
        limit: Option<usize>,
        offset: usize,
    ) -> EngineResult<QueryIter<'_, S, T>> {
        let schema = schema_of::<T>()?;
        let native = translate::translate(schema, query)?;
        let records = self.store.execute(&native, limit, offset)?;
        Ok(QueryIter {
            resolver: self.resolver(),
            schema,
            records: records.into_iter(),
            joins: query.joins().to_vec(),
            joined: needs_joins(schema, query.joins()),
            batch_size: self.config.iter_batch_size.max(1),
            ready: VecDeque::new(),
            failed: false,
        })
    }

    /// Number of matching records, capped at `limit`.
    pub fn count<T: Model>(&self, query: &Query<T>, limit: Option<usize>) -> EngineResult<usize> {
        let schema = schema_of::<T>()?;
        let native = translate::translate(schema, query)?;
        Ok(self.store.count(&native, limit)?)
    }

    /// Deletes every matching record with one bulk delete. Returns how many
    /// keys were deleted.
    pub fn delete_query<T: Model>(&self, query: &Query<T>) -> EngineResult<usize> {
        let schema = schema_of::<T>()?;
        let native = translate::translate(schema, query)?.keys_only();
        let keys: Vec<Key> = self
            .store
            .execute(&native, None, 0)?
            .into_iter()
            .map(|r| r.key().clone())
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }
        self.store.delete_many(&keys)?;
        info!(kind = schema.kind(), deleted = keys.len(), "Deleted by query");
        Ok(keys.len())
    }

    fn resolver(&self) -> JoinResolver<'_, S> {
        JoinResolver::new(&self.store, self.config.parallel_join_fetch)
    }
}

fn needs_joins<T>(schema: &Schema<T>, joins: &[Join]) -> bool {
    !joins.is_empty() || schema.has_joined_fields()
}

fn map_records<T: Model>(schema: &Schema<T>, records: &[Record]) -> MappingResult<Vec<T>> {
    records.iter().map(|r| mapper::from_record(schema, r)).collect()
}

/// Lazy iterator returned by [`Manager::iter`].
///
/// Yields `Err` once and then stops if mapping or a join pass fails.
pub struct QueryIter<'m, S, T: 'static> {
    resolver: JoinResolver<'m, S>,
    schema: &'static Schema<T>,
    records: std::vec::IntoIter<Record>,
    joins: Vec<Join>,
    joined: bool,
    batch_size: usize,
    ready: VecDeque<T>,
    failed: bool,
}

impl<S: StoreClient, T: Model> QueryIter<'_, S, T> {
    fn next_batch(&mut self) -> EngineResult<()> {
        let chunk: Vec<Record> = self.records.by_ref().take(self.batch_size).collect();
        let mut objects = map_records(self.schema, &chunk)?;
        self.resolver.resolve(self.schema, &mut objects, &self.joins)?;
        self.ready.extend(objects);
        Ok(())
    }
}

impl<S: StoreClient, T: Model> Iterator for QueryIter<'_, S, T> {
    type Item = EngineResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(obj) = self.ready.pop_front() {
            return Some(Ok(obj));
        }
        if self.failed {
            return None;
        }
        if !self.joined {
            let record = self.records.next()?;
            let mapped = mapper::from_record(self.schema, &record).map_err(EngineError::from);
            self.failed = mapped.is_err();
            return Some(mapped);
        }
        if let Err(e) = self.next_batch() {
            self.failed = true;
            return Some(Err(e));
        }
        self.ready.pop_front().map(Ok)
    }
}
