//! Query translation.
//!
//! Rewrites a [`Query`] over object fields into a [`NativeQuery`] over record
//! columns. Conditions and orders on the identity field target the reserved
//! key column, with the operand coerced through the key strategy. Operands
//! on relationship fields become reference keys.

use crate::error::{EngineError, EngineResult};
use crate::query::{Filter, Join, Operand, Query};
use datamap_model::{codec, keys, FieldSchema, MappingError, RelationAccessor, Schema};
use datamap_storage::{FilterOp, NativeQuery, Operand as NativeOperand, SortDirection};
use datamap_types::{KEY_COLUMN, StoreValue, Value};
use tracing::warn;

/// Operators a filter may use, with their native counterparts.
pub const OPERATORS: &[(&str, FilterOp)] = &[
    ("=", FilterOp::Equal),
    ("!=", FilterOp::NotEqual),
    ("<", FilterOp::LessThan),
    (">", FilterOp::GreaterThan),
    ("<=", FilterOp::LessThanOrEqual),
    (">=", FilterOp::GreaterThanOrEqual),
    ("IN", FilterOp::In),
];

/// Looks up `symbol` in [`OPERATORS`]. Surrounding whitespace is ignored and
/// `IN` matches in any case.
pub fn operator(symbol: &str) -> EngineResult<FilterOp> {
    let trimmed = symbol.trim();
    OPERATORS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(trimmed))
        .map(|(_, op)| *op)
        .ok_or_else(|| EngineError::UnsupportedOperator(symbol.to_string()))
}

/// Translates `query` for the kind described by `schema`.
///
/// Joins are validated here so that an unsupported join fails before any
/// store call.
pub fn translate<T>(schema: &Schema<T>, query: &Query<T>) -> EngineResult<NativeQuery> {
    for join in query.joins() {
        join_field(schema, join)?;
        if !join.sort_fields.is_empty() {
            return Err(EngineError::UnsupportedOperation(format!(
                "sorting joined field '{}' by {:?}",
                join.field, join.sort_fields
            )));
        }
    }

    let mut native = NativeQuery::new(schema.kind());
    for filter in query.filters() {
        let op = operator(&filter.op)?;
        let (column, operand) = if schema.is_identity(&filter.field) {
            (KEY_COLUMN, identity_operand(schema, op, &filter.operand)?)
        } else {
            let field = schema.require_field(&filter.field)?;
            if field.flags().unindexed {
                warn!(kind = schema.kind(), field = %filter.field, "Filter on unindexed field never matches");
            }
            (field.column(), field_operand(field, op, filter)?)
        };
        native = native.filter(column, op, operand);
    }

    for order in query.orders() {
        let column = if schema.is_identity(&order.field) {
            KEY_COLUMN
        } else {
            schema.require_field(&order.field)?.column()
        };
        let direction = if order.ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        native = native.sort(column, direction);
    }
    Ok(native)
}

/// The relationship accessor behind a join. Joining a plain field is an
/// unsupported operation.
fn join_field<'s, T>(
    schema: &'s Schema<T>,
    join: &Join,
) -> EngineResult<&'s dyn RelationAccessor<T>> {
    schema.require_field(&join.field)?.relation().ok_or_else(|| {
        EngineError::UnsupportedOperation(format!(
            "join on '{}', which is not a relationship field",
            join.field
        ))
    })
}

fn identity_operand<T>(
    schema: &Schema<T>,
    op: FilterOp,
    operand: &Operand,
) -> EngineResult<NativeOperand> {
    let to_key = |value: &Value| -> EngineResult<StoreValue> {
        Ok(StoreValue::Reference(keys::key_from_identity_value(schema, value)?))
    };
    let values = match operand {
        Operand::Value(value) => vec![to_key(value)?],
        Operand::List(values) => values.iter().map(to_key).collect::<EngineResult<_>>()?,
        Operand::Reference(key) => vec![StoreValue::Reference(key.clone())],
    };
    shape(op, values)
}

fn field_operand<T>(field: &FieldSchema<T>, op: FilterOp, filter: &Filter) -> EngineResult<NativeOperand> {
    let encode = |value: &Value| -> EngineResult<StoreValue> {
        match value {
            Value::Null => Ok(StoreValue::Null),
            other if field.is_relation() => Err(MappingError::TypeMismatch {
                expected: format!("reference for relationship field '{}'", field.name()),
                actual: other.type_name().to_string(),
            }
            .into()),
            other => Ok(codec::encode_value(other.clone())),
        }
    };
    let values = match &filter.operand {
        Operand::Value(value) => vec![encode(value)?],
        Operand::List(values) => values.iter().map(encode).collect::<EngineResult<_>>()?,
        Operand::Reference(key) if field.is_relation() => vec![StoreValue::Reference(key.clone())],
        Operand::Reference(key) => {
            return Err(MappingError::TypeMismatch {
                expected: format!("value for field '{}'", field.name()),
                actual: format!("reference {key}"),
            }
            .into());
        }
    };
    shape(op, values)
}

/// `IN` takes a list; every other operator takes exactly one value.
fn shape(op: FilterOp, mut values: Vec<StoreValue>) -> EngineResult<NativeOperand> {
    if op == FilterOp::In {
        return Ok(NativeOperand::List(values));
    }
    match (values.pop(), values.is_empty()) {
        (Some(value), true) => Ok(NativeOperand::Single(value)),
        _ => Err(MappingError::TypeMismatch {
            expected: format!("a single value for operator {op}"),
            actual: "a list".to_string(),
        }
        .into()),
    }
}
