//! Record store contract describing persistence adapters.

use std::borrow::Cow;
use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::entities::Entity;
use crate::domain::fields::{FieldValue, Filter, SortKey};

/// One backend row: column name to JSON value.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("record not found")]
    NotFound,
    #[error("failed to encode row: {0}")]
    Encode(String),
    #[error("failed to decode backend row: {0}")]
    Decode(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
}

impl BackendError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn encode(err: impl std::fmt::Display) -> Self {
        Self::Encode(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Equality filters, one optional sort key and an optional row limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub filters: Vec<Filter>,
    pub order: Option<SortKey>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, key: SortKey) -> Self {
        self.order = Some(key);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` satisfies every filter. Unknown columns never match.
    pub fn matches<E: Entity>(&self, record: &E) -> bool {
        self.filters.iter().all(|filter| {
            record
                .field(&filter.column)
                .is_some_and(|value| value.compare(&filter.value) == Ordering::Equal)
        })
    }

    /// Evaluate the query over in-memory records, the way a backend would.
    ///
    /// Sorting is stable, so ties keep their collection order.
    pub fn apply<E: Entity>(&self, records: impl IntoIterator<Item = E>) -> Vec<E> {
        let mut selected: Vec<E> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();

        if let Some(key) = &self.order {
            selected.sort_by(|left, right| {
                let left = left.field(&key.column).unwrap_or(FieldValue::Null);
                let right = right.field(&key.column).unwrap_or(FieldValue::Null);
                let ordering = left.compare(&right);
                if key.is_ascending() {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Identity behind the current backend connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Row>, BackendError>;

    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError>;

    /// Merge `row` into the record with `id`; `NotFound` when nothing matched.
    async fn update(&self, table: &str, id: &str, row: Row) -> Result<Row, BackendError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError>;

    async fn session(&self) -> Result<Option<Session>, BackendError>;
}

/// Table and column names are interpolated into queries; only plain
/// lowercase identifiers are accepted.
pub fn validate_identifier(name: &str) -> Result<&str, BackendError> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_head && valid_tail {
        Ok(name)
    } else {
        Err(BackendError::InvalidIdentifier(name.to_owned()))
    }
}
