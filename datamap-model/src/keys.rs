//! Key strategy.
//!
//! Produces record keys from an object's identity field and writes store keys
//! back into it, according to the schema's [`IdGenerator`].

use crate::error::{MappingError, MappingResult};
use crate::field::FieldKind;
use crate::schema::{IdGenerator, Schema};
use datamap_types::{Key, KeyId, Value};
use uuid::Uuid;

/// Key to use when inserting `obj`.
///
/// - `Assigned`: the identity must already be set; its string form is the name.
/// - `AutoIncrement`: an incomplete key; the store allocates the id.
/// - `Uuid`: a fresh random UUID name.
pub fn generate_key<T>(schema: &Schema<T>, obj: &T) -> MappingResult<Key> {
    let identity = schema.identity();
    match identity.generator() {
        IdGenerator::Assigned => {
            let value = read_identity(schema, obj)?;
            assigned_key(schema, &value)
        }
        IdGenerator::AutoIncrement => Ok(Key::incomplete(schema.kind())?),
        IdGenerator::Uuid => Ok(Key::with_name(schema.kind(), Uuid::new_v4().to_string())?),
        other @ IdGenerator::Sequence(_) => Err(MappingError::UnsupportedIdGenerator(other.to_string())),
    }
}

/// Writes the identifier of `key` into the identity field of `obj`,
/// converted to the field's declared type.
pub fn apply_key<T>(schema: &Schema<T>, obj: &mut T, key: &Key) -> MappingResult<()> {
    let identity = schema.identity();
    let value = match (identity.generator(), key.id()) {
        (IdGenerator::Assigned, KeyId::Name(name)) => match identity.kind() {
            FieldKind::Int => Value::Int(
                name.parse()
                    .map_err(|_| MappingError::mismatch("integer key name", name.as_str()))?,
            ),
            _ => Value::Text(name.clone()),
        },
        (IdGenerator::AutoIncrement, KeyId::Id(id)) => match identity.kind() {
            FieldKind::Int => Value::Int(*id),
            _ => Value::Text(id.to_string()),
        },
        (IdGenerator::Uuid, KeyId::Name(name)) => match identity.kind() {
            FieldKind::Text => Value::Text(name.clone()),
            other => {
                return Err(MappingError::mismatch("text identity for uuid keys", format!("{other:?}")));
            }
        },
        (generator @ IdGenerator::Sequence(_), _) => {
            return Err(MappingError::UnsupportedIdGenerator(generator.to_string()));
        }
        (generator, _) => {
            return Err(MappingError::mismatch(
                format!("{generator} key"),
                key.to_string(),
            ));
        }
    };
    identity
        .accessor()
        .write(obj, value)
        .map_err(|reason| MappingError::access(identity.name(), reason))
}

/// Builds the key addressed by an identity value, as given on an object or
/// in a filter. String input is parsed where the key needs a number.
pub fn key_from_identity_value<T>(schema: &Schema<T>, value: &Value) -> MappingResult<Key> {
    match schema.identity().generator() {
        IdGenerator::Assigned => assigned_key(schema, value),
        IdGenerator::AutoIncrement => match value {
            Value::Int(id) => Ok(Key::with_id(schema.kind(), *id)?),
            Value::Text(s) => {
                let id = s
                    .trim()
                    .parse()
                    .map_err(|_| MappingError::mismatch("integer identifier", s.as_str()))?;
                Ok(Key::with_id(schema.kind(), id)?)
            }
            Value::Null => Err(missing(schema)),
            other => Err(MappingError::mismatch("integer identifier", other.type_name())),
        },
        IdGenerator::Uuid => match value {
            Value::Text(s) => {
                Uuid::parse_str(s).map_err(|_| MappingError::mismatch("uuid identifier", s.as_str()))?;
                Ok(Key::with_name(schema.kind(), s.as_str())?)
            }
            Value::Null => Err(missing(schema)),
            other => Err(MappingError::mismatch("uuid identifier", other.type_name())),
        },
        other @ IdGenerator::Sequence(_) => Err(MappingError::UnsupportedIdGenerator(other.to_string())),
    }
}

/// Key of an object whose identity is already known (update, get, delete,
/// relationship references).
pub fn key_of<T>(schema: &Schema<T>, obj: &T) -> MappingResult<Key> {
    let value = read_identity(schema, obj)?;
    key_from_identity_value(schema, &value)
}

fn read_identity<T>(schema: &Schema<T>, obj: &T) -> MappingResult<Value> {
    let identity = schema.identity();
    identity
        .accessor()
        .read(obj)
        .map_err(|reason| MappingError::access(identity.name(), reason))
}

fn assigned_key<T>(schema: &Schema<T>, value: &Value) -> MappingResult<Key> {
    let name = match value {
        Value::Int(id) => id.to_string(),
        Value::Text(s) if !s.is_empty() => s.clone(),
        Value::Text(_) | Value::Null => return Err(missing(schema)),
        other => return Err(MappingError::mismatch("integer or text identifier", other.type_name())),
    };
    Ok(Key::with_name(schema.kind(), name)?)
}

fn missing<T>(schema: &Schema<T>) -> MappingError {
    MappingError::MissingIdentity {
        kind: schema.kind().to_string(),
        field: schema.identity().name().to_string(),
    }
}
