//! Store-native queries.
//!
//! A [`NativeQuery`] is what the query translator produces: a kind, a flat
//! list of column predicates, sort orders and a keys-only switch. The
//! evaluation here is shared by the in-process adapters and follows the
//! indexing rules of the persisted layout: only indexed, indexable
//! properties (plus the reserved key column) can match a predicate or take
//! part in a sort.

use datamap_types::{KEY_COLUMN, Record, StoreValue};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a native filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    /// Matches when the column equals any value of a list operand.
    In,
}

impl FilterOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThanOrEqual => ">=",
            Self::In => "IN",
        }
    }

    fn accepts(self, ordering: Option<Ordering>) -> bool {
        match self {
            Self::Equal | Self::In => ordering == Some(Ordering::Equal),
            Self::NotEqual => ordering != Some(Ordering::Equal),
            Self::LessThan => ordering == Some(Ordering::Less),
            Self::GreaterThan => ordering == Some(Ordering::Greater),
            Self::LessThanOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Self::GreaterThanOrEqual => {
                matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
            }
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a native filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(StoreValue),
    List(Vec<StoreValue>),
}

/// One column predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFilter {
    pub column: String,
    pub op: FilterOp,
    pub operand: Operand,
}

impl NativeFilter {
    /// Whether `record` satisfies this predicate. A record without an
    /// indexed value in the column never matches, whatever the operator.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Some(value) = indexed_value(record, &self.column) else {
            return false;
        };
        match &self.operand {
            Operand::Single(operand) => self.op.accepts(value.compare(operand)),
            Operand::List(items) if self.op == FilterOp::In => items
                .iter()
                .any(|item| value.compare(item) == Some(Ordering::Equal)),
            Operand::List(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSort {
    pub column: String,
    pub direction: SortDirection,
}

/// A flat filter/sort query over one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    kind: String,
    filters: Vec<NativeFilter>,
    sorts: Vec<NativeSort>,
    keys_only: bool,
}

impl NativeQuery {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            filters: Vec::new(),
            sorts: Vec::new(),
            keys_only: false,
        }
    }

    #[must_use]
    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, operand: Operand) -> Self {
        self.filters.push(NativeFilter {
            column: column.into(),
            op,
            operand,
        });
        self
    }

    #[must_use]
    pub fn sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(NativeSort {
            column: column.into(),
            direction,
        });
        self
    }

    /// Switches the query to return keys without properties.
    #[must_use]
    pub const fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn filters(&self) -> &[NativeFilter] {
        &self.filters
    }

    #[must_use]
    pub fn sorts(&self) -> &[NativeSort] {
        &self.sorts
    }

    #[must_use]
    pub const fn is_keys_only(&self) -> bool {
        self.keys_only
    }

    /// Whether `record` belongs in the result set: right kind, every filter
    /// satisfied, and an indexed value present for every sort column.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        record.key().kind() == self.kind
            && self.filters.iter().all(|f| f.matches(record))
            && self
                .sorts
                .iter()
                .all(|s| indexed_value(record, &s.column).is_some())
    }

    /// Result order of two matching records. Ties fall back to key order.
    #[must_use]
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for sort in &self.sorts {
            let ordering = match (
                indexed_value(a, &sort.column),
                indexed_value(b, &sort.column),
            ) {
                (Some(x), Some(y)) => x.sort_cmp(&y),
                _ => Ordering::Equal,
            };
            let ordering = match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.key().cmp(b.key())
    }

    /// Filters, sorts and pages `records`, stripping properties for a
    /// keys-only query. Without sort orders the input order is kept.
    pub(crate) fn select<'r>(
        &self,
        records: impl IntoIterator<Item = &'r Record>,
        limit: Option<usize>,
        offset: usize,
    ) -> Vec<Record> {
        let mut matched: Vec<&Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        if !self.sorts.is_empty() {
            matched.sort_by(|a, b| self.compare(a, b));
        }
        matched
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|r| if self.keys_only { r.keys_only() } else { r.clone() })
            .collect()
    }

    pub(crate) fn count_matching<'r>(
        &self,
        records: impl IntoIterator<Item = &'r Record>,
        limit: Option<usize>,
    ) -> usize {
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .take(limit.unwrap_or(usize::MAX))
            .count()
    }
}

/// Value a predicate or sort sees for `column`: the record's key for the
/// reserved key column, otherwise the property if it is indexed and its
/// value indexable.
fn indexed_value<'r>(record: &'r Record, column: &str) -> Option<Cow<'r, StoreValue>> {
    if column == KEY_COLUMN {
        return Some(Cow::Owned(StoreValue::Reference(record.key().clone())));
    }
    record
        .property(column)
        .filter(|p| p.indexed && p.value.is_indexable())
        .map(|p| Cow::Borrowed(&p.value))
}
