//! Join resolution.
//!
//! Back-fills relationship fields on a batch of freshly mapped objects. Per
//! field, the distinct referenced keys are fetched with a single bulk read;
//! the records are then mapped once per key and the same instance is shared
//! by every object referencing it.

use crate::error::{EngineError, EngineResult};
use crate::query::Join;
use datamap_model::{RelationAccessor, ResolvedCache, Schema};
use datamap_storage::StoreClient;
use datamap_types::{Key, Record};
use std::collections::{HashMap, HashSet};
use std::thread;
use tracing::{debug, warn};

type Fetched = HashMap<Key, Record>;

/// Resolves joins against one store.
pub struct JoinResolver<'s, S: ?Sized> {
    store: &'s S,
    parallel: bool,
}

struct Pending<'a, T> {
    field: &'a str,
    accessor: &'a dyn RelationAccessor<T>,
    keys: Vec<Key>,
}

impl<'s, S: StoreClient + ?Sized> JoinResolver<'s, S> {
    /// `parallel` issues the bulk fetches of different fields from scoped
    /// threads instead of one after another.
    pub const fn new(store: &'s S, parallel: bool) -> Self {
        Self { store, parallel }
    }

    /// Resolves the union of `joins` and the schema's always-joined fields on
    /// every object of `objects`.
    ///
    /// Fails with `JoinFetch` if any referenced record cannot be fetched, in
    /// which case no object is modified.
    pub fn resolve<T>(&self, schema: &Schema<T>, objects: &mut [T], joins: &[Join]) -> EngineResult<()> {
        let pending = Self::collect(schema, objects, joins)?;
        if pending.is_empty() {
            return Ok(());
        }
        let fetched = self.fetch_all(&pending)?;

        let mut cache = ResolvedCache::new();
        for (entry, records) in pending.iter().zip(&fetched) {
            for obj in objects.iter_mut() {
                if entry.accessor.is_resolved(obj) {
                    continue;
                }
                let Some(key) = entry.accessor.reference(obj)? else {
                    continue;
                };
                entry.accessor.resolve(obj, records.get(&key), &mut cache)?;
            }
        }
        debug!(kind = schema.kind(), objects = objects.len(), resolved = cache.len(), "Resolved joins");
        Ok(())
    }

    /// First walk: the distinct unresolved keys per relationship field.
    fn collect<'a, T>(
        schema: &'a Schema<T>,
        objects: &[T],
        joins: &'a [Join],
    ) -> EngineResult<Vec<Pending<'a, T>>> {
        let mut names: Vec<&'a str> = Vec::new();
        for join in joins {
            if !names.contains(&join.field.as_str()) {
                names.push(&join.field);
            }
        }
        for field in schema.joined_fields() {
            if !names.contains(&field.name()) {
                names.push(field.name());
            }
        }

        let mut pending = Vec::with_capacity(names.len());
        for name in names {
            let accessor = schema.require_field(name)?.relation().ok_or_else(|| {
                EngineError::UnsupportedOperation(format!("'{name}' is not a relationship field"))
            })?;
            let mut seen = HashSet::new();
            let mut keys = Vec::new();
            for obj in objects {
                if accessor.is_resolved(obj) {
                    continue;
                }
                if let Some(key) = accessor.reference(obj)? {
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    }
                }
            }
            if !keys.is_empty() {
                pending.push(Pending {
                    field: name,
                    accessor,
                    keys,
                });
            }
        }
        Ok(pending)
    }

    /// One bulk fetch per field, checked for completeness.
    fn fetch_all<T>(&self, pending: &[Pending<'_, T>]) -> EngineResult<Vec<Fetched>> {
        let results: Vec<EngineResult<Fetched>> = if self.parallel && pending.len() > 1 {
            thread::scope(|scope| {
                let handles: Vec<_> = pending
                    .iter()
                    .map(|entry| {
                        let keys = &entry.keys;
                        (entry.field, scope.spawn(move || self.store.get_many(keys)))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|(field, handle)| -> EngineResult<Fetched> {
                        let fetched = handle.join().map_err(|_| EngineError::JoinFetch {
                            field: field.to_string(),
                            reason: "fetch thread panicked".to_string(),
                        })?;
                        fetched.map_err(|e| fetch_error(field, &e))
                    })
                    .collect()
            })
        } else {
            pending
                .iter()
                .map(|entry| {
                    self.store
                        .get_many(&entry.keys)
                        .map_err(|e| fetch_error(entry.field, &e))
                })
                .collect()
        };

        pending
            .iter()
            .zip(results)
            .map(|(entry, result)| -> EngineResult<Fetched> {
                let fetched = result?;
                debug!(field = entry.field, keys = entry.keys.len(), found = fetched.len(), "Fetched join batch");
                if let Some(missing) = entry.keys.iter().find(|k| !fetched.contains_key(*k)) {
                    warn!(field = entry.field, key = %missing, "Join target missing");
                    return Err(EngineError::JoinFetch {
                        field: entry.field.to_string(),
                        reason: format!(
                            "{} of {} referenced records missing, first {missing}",
                            entry.keys.len() - fetched.len(),
                            entry.keys.len()
                        ),
                    });
                }
                Ok(fetched)
            })
            .collect()
    }
}

fn fetch_error(field: &str, err: &dyn std::error::Error) -> EngineError {
    warn!(field, error = %err, "Join fetch failed");
    EngineError::JoinFetch {
        field: field.to_string(),
        reason: err.to_string(),
    }
}
