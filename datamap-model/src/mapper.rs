//! Entity mapper.
//!
//! Applies the codec and key strategy across every persisted field of an
//! object to build a record, and the reverse.

use crate::codec;
use crate::error::{MappingError, MappingResult};
use crate::keys;
use crate::schema::Schema;
use datamap_types::{Key, Record, StoreValue};

/// Builds the record for `obj` under `key`, fields in declaration order.
/// Unindexed fields are written in the store's non-indexed mode.
pub fn to_record<T>(schema: &Schema<T>, obj: &T, key: Key) -> MappingResult<Record> {
    let mut record = Record::new(key);
    for field in schema.fields() {
        let value = codec::encode(field, obj)?;
        if field.flags().unindexed {
            record.set_unindexed(field.column(), value);
        } else {
            record.set(field.column(), value);
        }
    }
    Ok(record)
}

/// Record for a new object, keyed by the insert-time key strategy.
pub fn insert_record<T>(schema: &Schema<T>, obj: &T) -> MappingResult<Record> {
    let key = keys::generate_key(schema, obj)?;
    to_record(schema, obj, key)
}

/// Record for an existing object, keyed by its current identity.
pub fn update_record<T>(schema: &Schema<T>, obj: &T) -> MappingResult<Record> {
    let key = keys::key_of(schema, obj)?;
    to_record(schema, obj, key)
}

/// Fills `obj` from `record`: every persisted field, then the identity.
/// Columns absent from the record decode as null.
///
/// Decoding happens on a fresh default instance that replaces `obj` only
/// once every field has decoded; on error `obj` is left as it was.
pub fn populate<T: Default>(schema: &Schema<T>, obj: &mut T, record: &Record) -> MappingResult<()> {
    *obj = from_record(schema, record)?;
    Ok(())
}

/// Allocates a new `T` and populates it from `record`.
pub fn from_record<T: Default>(schema: &Schema<T>, record: &Record) -> MappingResult<T> {
    check_kind(schema, record.key())?;
    let mut obj = T::default();
    for field in schema.fields() {
        let stored = record
            .get(field.column())
            .cloned()
            .unwrap_or(StoreValue::Null);
        codec::decode(field, &mut obj, stored)?;
    }
    keys::apply_key(schema, &mut obj, record.key())?;
    Ok(obj)
}

/// Allocates a new `T` carrying only the identity from `key`.
pub fn from_key<T: Default>(schema: &Schema<T>, key: &Key) -> MappingResult<T> {
    check_kind(schema, key)?;
    let mut obj = T::default();
    keys::apply_key(schema, &mut obj, key)?;
    Ok(obj)
}

/// Keys-only mapping: the identity is set, every other field is left at its
/// default and the record's properties are not decoded.
pub fn from_record_keys_only<T: Default>(schema: &Schema<T>, record: &Record) -> MappingResult<T> {
    from_key(schema, record.key())
}

fn check_kind<T>(schema: &Schema<T>, key: &Key) -> MappingResult<()> {
    if key.kind() == schema.kind() {
        Ok(())
    } else {
        Err(MappingError::TypeMismatch {
            expected: format!("key of kind '{}'", schema.kind()),
            actual: key.to_string(),
        })
    }
}
