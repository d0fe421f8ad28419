//! Typed entity access on top of a generic [`RecordStore`].

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use crate::application::repos::{BackendError, RecordQuery, RecordStore, Row, Session};
use crate::domain::entities::Entity;

pub(crate) const METRIC_REMOTE_FAILURES: &str = "kaizen_remote_failures_total";

#[derive(Clone)]
pub struct RemoteStoreAdapter {
    store: Arc<dyn RecordStore>,
}

impl RemoteStoreAdapter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list<E: Entity>(&self, query: &RecordQuery) -> Result<Vec<E>, BackendError> {
        let table = E::KIND.table();
        let rows = self
            .store
            .query(table, query)
            .await
            .inspect_err(|err| record_failure(table, "query", err))?;
        debug!(table, rows = rows.len(), "remote query returned");
        rows.into_iter().map(from_row).collect()
    }

    pub async fn insert<E: Entity>(&self, record: &E) -> Result<E, BackendError> {
        let table = E::KIND.table();
        let row = to_row(record)?;
        let stored = self
            .store
            .insert(table, row)
            .await
            .inspect_err(|err| record_failure(table, "insert", err))?;
        from_row(stored)
    }

    /// Send the fields present in `patch` plus a fresh `updated_at`.
    pub async fn update<E: Entity>(
        &self,
        id: &str,
        patch: &E::Patch,
        now: OffsetDateTime,
    ) -> Result<E, BackendError> {
        let table = E::KIND.table();
        let mut row = to_row(patch)?;
        let stamp = now.format(&Rfc3339).map_err(BackendError::encode)?;
        row.insert("updated_at".to_owned(), Value::String(stamp));

        let stored = self
            .store
            .update(table, id, row)
            .await
            .inspect_err(|err| record_failure(table, "update", err))?;
        from_row(stored)
    }

    pub async fn delete<E: Entity>(&self, id: &str) -> Result<(), BackendError> {
        let table = E::KIND.table();
        self.store
            .delete(table, id)
            .await
            .inspect_err(|err| record_failure(table, "delete", err))
    }

    pub async fn session(&self) -> Result<Option<Session>, BackendError> {
        self.store
            .session()
            .await
            .inspect_err(|err| record_failure("auth", "session", err))
    }
}

impl std::fmt::Debug for RemoteStoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreAdapter").finish_non_exhaustive()
    }
}

fn record_failure(table: &'static str, op: &'static str, err: &BackendError) {
    counter!(METRIC_REMOTE_FAILURES, "table" => table, "op" => op).increment(1);
    warn!(table, op, error = %err, "remote store call failed");
}

pub(crate) fn to_row<T: Serialize>(value: &T) -> Result<Row, BackendError> {
    match serde_json::to_value(value).map_err(BackendError::encode)? {
        Value::Object(row) => Ok(row),
        other => Err(BackendError::Encode(format!(
            "expected a JSON object, got `{other}`"
        ))),
    }
}

pub(crate) fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, BackendError> {
    serde_json::from_value(Value::Object(row)).map_err(BackendError::decode)
}
