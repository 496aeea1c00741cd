//! Value codec.
//!
//! Converts one field value to the store's restricted value set and back.
//! Encoding rules, first match wins:
//!
//! 1. empty relationship → null
//! 2. relationship → reference key of the target
//! 3. structured document → JSON string, then rule 6
//! 4. bytes → blob, truncated to [`MAX_BLOB_BYTES`]
//! 5. enumerated → its label
//! 6. text longer than [`LONG_TEXT_THRESHOLD`] characters → long text
//! 7. anything else → scalar as-is
//!
//! Truncation in rule 4 is silent: payloads above the limit lose their tail.

use crate::error::{MappingError, MappingResult};
use crate::schema::{FieldAccess, FieldFlags, FieldSchema};
use datamap_types::{StoreValue, Value, LONG_TEXT_THRESHOLD, MAX_BLOB_BYTES};

/// Encodes the current value of `field` on `obj`.
pub fn encode<T>(field: &FieldSchema<T>, obj: &T) -> MappingResult<StoreValue> {
    match field.access() {
        FieldAccess::Relation(accessor) => Ok(accessor
            .reference(obj)?
            .map_or(StoreValue::Null, StoreValue::Reference)),
        FieldAccess::Value(accessor) => {
            let value = accessor
                .read(obj)
                .map_err(|reason| MappingError::access(field.name(), reason))?;
            Ok(encode_value(value))
        }
    }
}

/// Decodes `stored` into the field `field` of `obj`.
///
/// Relationship columns become unresolved references; their targets stay
/// unpopulated until a join pass runs.
pub fn decode<T>(field: &FieldSchema<T>, obj: &mut T, stored: StoreValue) -> MappingResult<()> {
    match field.access() {
        FieldAccess::Relation(accessor) => {
            let key = match stored {
                StoreValue::Reference(key) => Some(key),
                StoreValue::Null => None,
                other => {
                    return Err(MappingError::access(
                        field.name(),
                        format!("expected reference, got {}", other.type_name()),
                    ));
                }
            };
            accessor.set_reference(obj, key);
            Ok(())
        }
        FieldAccess::Value(accessor) => {
            let value = decode_value(field.flags(), stored)
                .map_err(|reason| MappingError::access(field.name(), reason))?;
            accessor
                .write(obj, value)
                .map_err(|reason| MappingError::access(field.name(), reason))
        }
    }
}

/// Encodes a plain field value. Also used for filter operands.
#[must_use]
pub fn encode_value(value: Value) -> StoreValue {
    match value {
        Value::Null => StoreValue::Null,
        Value::Document(doc) => text_value(doc.to_string()),
        Value::Bytes(mut bytes) => {
            bytes.truncate(MAX_BLOB_BYTES);
            StoreValue::Blob(bytes)
        }
        Value::Label(label) => StoreValue::Text(label),
        Value::Text(text) => text_value(text),
        Value::Bool(b) => StoreValue::Bool(b),
        Value::Int(n) => StoreValue::Int(n),
        Value::Float(f) => StoreValue::Float(f),
    }
}

/// Decodes a plain stored value, unwrapping long text and blobs. Text in a
/// document column is parsed back into a document; text in an enumerated
/// column becomes a label.
pub fn decode_value(flags: FieldFlags, stored: StoreValue) -> Result<Value, String> {
    match stored {
        StoreValue::Null => Ok(Value::Null),
        StoreValue::Text(text) | StoreValue::LongText(text) => {
            if flags.document {
                serde_json::from_str(&text)
                    .map(Value::Document)
                    .map_err(|e| format!("invalid document: {e}"))
            } else if flags.enumerated {
                Ok(Value::Label(text))
            } else {
                Ok(Value::Text(text))
            }
        }
        StoreValue::Blob(bytes) => Ok(Value::Bytes(bytes)),
        StoreValue::Bool(b) => Ok(Value::Bool(b)),
        StoreValue::Int(n) => Ok(Value::Int(n)),
        StoreValue::Float(f) => Ok(Value::Float(f)),
        StoreValue::Reference(key) => Err(format!("unexpected reference {key} in a value column")),
    }
}

fn text_value(text: String) -> StoreValue {
    if text.chars().count() > LONG_TEXT_THRESHOLD {
        StoreValue::LongText(text)
    } else {
        StoreValue::Text(text)
    }
}
