//! Typed column values shared by local filtering and remote queries.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// A single column value as seen by filters and sort keys.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(OffsetDateTime),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Total order used for local sorting.
    ///
    /// `Null` sorts after every other value, matching Postgres' default of
    /// `NULLS LAST` for ascending and `NULLS FIRST` for descending order.
    /// Values of unrelated kinds fall back to a fixed kind rank.
    pub fn compare(&self, other: &Self) -> Ordering {
        use FieldValue::*;

        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Greater,
            (_, Null) => Ordering::Less,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Text(a), Text(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// JSON representation used in rows sent to a record store.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(value) => Value::Bool(*value),
            FieldValue::Int(value) => Value::from(*value),
            FieldValue::Float(value) => Value::from(*value),
            FieldValue::Text(value) => Value::String(value.clone()),
            FieldValue::Timestamp(value) => value
                .format(&Rfc3339)
                .map(Value::String)
                .unwrap_or(Value::Null),
        }
    }

    /// Plain-text rendering used in query strings. `None` for `Null`.
    pub fn to_query_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(value) => Some(value.to_string()),
            FieldValue::Int(value) => Some(value.to_string()),
            FieldValue::Float(value) => Some(value.to_string()),
            FieldValue::Text(value) => Some(value.clone()),
            FieldValue::Timestamp(value) => value.format(&Rfc3339).ok(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Bool(_) => 0,
            FieldValue::Int(_) | FieldValue::Float(_) => 1,
            FieldValue::Text(_) => 2,
            FieldValue::Timestamp(_) => 3,
            FieldValue::Null => 4,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<OffsetDateTime> for FieldValue {
    fn from(value: OffsetDateTime) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Column plus direction; one per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: Cow<'static, str>,
    pub direction: Direction,
}

impl SortKey {
    pub const fn ascending(column: &'static str) -> Self {
        Self {
            column: Cow::Borrowed(column),
            direction: Direction::Ascending,
        }
    }

    pub const fn descending(column: &'static str) -> Self {
        Self {
            column: Cow::Borrowed(column),
            direction: Direction::Descending,
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == Direction::Ascending
    }
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: Cow<'static, str>,
    pub value: FieldValue,
}
