//! Backend-agnostic query description.

use datamap_model::{keys, schema_of, MappingResult, Model};
use datamap_types::{Key, Value};
use std::fmt;
use std::marker::PhantomData;

/// Right-hand side of a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    /// Values for an `IN` filter.
    List(Vec<Value>),
    /// Key of a related object, for filters on relationship fields.
    Reference(Key),
}

/// One (field, operator, operand) condition.
///
/// The operator is kept as written and checked against the operator table
/// when the query is translated.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: String,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

/// A relationship field to resolve after fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub field: String,
    /// Sort fields on the joined records. Always rejected at translation.
    pub sort_fields: Vec<String>,
}

/// Filters, orders and joins over objects of type `T`.
pub struct Query<T> {
    filters: Vec<Filter>,
    orders: Vec<Order>,
    joins: Vec<Join>,
    next_offset: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Query<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            orders: Vec::new(),
            joins: Vec::new(),
            next_offset: 0,
            _marker: PhantomData,
        }
    }

    /// Adds `field op value`.
    #[must_use]
    pub fn filter(self, field: &str, op: &str, value: impl Into<Value>) -> Self {
        self.filter_operand(field, op, Operand::Value(value.into()))
    }

    /// Adds `field IN (values...)`.
    #[must_use]
    pub fn filter_in<V: Into<Value>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filter_operand(field, "IN", Operand::List(values))
    }

    /// Adds a condition comparing a relationship field with `target`.
    ///
    /// Fails when `target` has no identity yet.
    pub fn filter_related<U: Model>(self, field: &str, op: &str, target: &U) -> MappingResult<Self> {
        let key = keys::key_of(schema_of::<U>()?, target)?;
        Ok(self.filter_operand(field, op, Operand::Reference(key)))
    }

    #[must_use]
    pub fn filter_operand(mut self, field: &str, op: &str, operand: Operand) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: op.to_string(),
            operand,
        });
        self
    }

    #[must_use]
    pub fn order(mut self, field: &str) -> Self {
        self.orders.push(Order {
            field: field.to_string(),
            ascending: true,
        });
        self
    }

    #[must_use]
    pub fn order_desc(mut self, field: &str) -> Self {
        self.orders.push(Order {
            field: field.to_string(),
            ascending: false,
        });
        self
    }

    /// Resolves the relationship field `field` on every fetched object.
    #[must_use]
    pub fn join(self, field: &str) -> Self {
        self.join_sorted(field, &[])
    }

    #[must_use]
    pub fn join_sorted(mut self, field: &str, sort_fields: &[&str]) -> Self {
        self.joins.push(Join {
            field: field.to_string(),
            sort_fields: sort_fields.iter().map(ToString::to_string).collect(),
        });
        self
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Offset just past the records consumed by the last fetch.
    #[must_use]
    pub const fn next_offset(&self) -> usize {
        self.next_offset
    }

    pub(crate) fn set_next_offset(&mut self, offset: usize) {
        self.next_offset = offset;
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            orders: self.orders.clone(),
            joins: self.joins.clone(),
            next_offset: self.next_offset,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filters", &self.filters)
            .field("orders", &self.orders)
            .field("joins", &self.joins)
            .field("next_offset", &self.next_offset)
            .finish()
    }
}
