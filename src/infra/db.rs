//! Record store talking to Postgres directly.
//!
//! Rows travel as JSON: reads select `to_jsonb(t)` and writes go through
//! `jsonb_populate_record`, so every table shares one code path and column
//! types stay owned by the schema.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
    types::Json,
};
use tracing::debug;

use crate::application::repos::{
    BackendError, RecordQuery, RecordStore, Row, Session, validate_identifier,
};
use crate::domain::fields::Direction;

#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: Arc<PgPool>,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    pub(crate) fn select_query<'q>(
        table: &str,
        record_query: &'q RecordQuery,
    ) -> Result<QueryBuilder<'q, Postgres>, BackendError> {
        let table = validate_identifier(table)?;
        let mut qb = QueryBuilder::new("SELECT to_jsonb(t) FROM ");
        qb.push(table);
        qb.push(" t WHERE TRUE");

        for filter in &record_query.filters {
            let column = validate_identifier(&filter.column)?;
            qb.push(" AND to_jsonb(t) -> '");
            qb.push(column);
            qb.push("' = ");
            qb.push_bind(Json(filter.value.to_json()));
        }

        if let Some(order) = &record_query.order {
            let column = validate_identifier(&order.column)?;
            qb.push(" ORDER BY t.");
            qb.push(column);
            qb.push(match order.direction {
                Direction::Ascending => " ASC",
                Direction::Descending => " DESC",
            });
        }

        if let Some(limit) = record_query.limit {
            let limit = i64::try_from(limit)
                .map_err(|_| BackendError::encode("limit exceeds supported range"))?;
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }

        Ok(qb)
    }

    pub(crate) fn insert_query(table: &str, row: Row) -> Result<QueryBuilder<'static, Postgres>, BackendError> {
        let table = validate_identifier(table)?;
        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(table);
        qb.push(" SELECT * FROM jsonb_populate_record(NULL::");
        qb.push(table);
        qb.push(", ");
        qb.push_bind(Json(Value::Object(row)));
        qb.push(") RETURNING to_jsonb(");
        qb.push(table);
        qb.push(".*)");
        Ok(qb)
    }

    /// Only the columns present in `row` are assigned.
    pub(crate) fn update_query(
        table: &str,
        id: &str,
        row: Row,
    ) -> Result<QueryBuilder<'static, Postgres>, BackendError> {
        let table = validate_identifier(table)?;
        let columns = row
            .keys()
            .filter(|column| column.as_str() != "id")
            .map(|column| validate_identifier(column).map(str::to_owned))
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(BackendError::encode("update carries no columns"));
        }

        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(table);
        qb.push(" t SET ");
        {
            let mut assignments = qb.separated(", ");
            for column in &columns {
                assignments.push(format!("{column} = p.{column}"));
            }
        }
        qb.push(" FROM jsonb_populate_record(NULL::");
        qb.push(table);
        qb.push(", ");
        qb.push_bind(Json(Value::Object(row)));
        qb.push(") p WHERE t.id::text = ");
        qb.push_bind(id.to_owned());
        qb.push(" RETURNING to_jsonb(t.*)");
        Ok(qb)
    }

    pub(crate) fn delete_query(
        table: &str,
        id: &str,
    ) -> Result<QueryBuilder<'static, Postgres>, BackendError> {
        let table = validate_identifier(table)?;
        let mut qb = QueryBuilder::new("DELETE FROM ");
        qb.push(table);
        qb.push(" WHERE id::text = ");
        qb.push_bind(id.to_owned());
        Ok(qb)
    }
}

impl std::fmt::Debug for PostgresRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRecordStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn query(&self, table: &str, record_query: &RecordQuery) -> Result<Vec<Row>, BackendError> {
        let mut qb = Self::select_query(table, record_query)?;
        debug!(sql = qb.sql(), "postgres query");
        let rows: Vec<Json<Row>> = qb
            .build_query_scalar()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        let mut qb = Self::insert_query(table, row)?;
        let Json(stored) = qb
            .build_query_scalar::<Json<Row>>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(stored)
    }

    async fn update(&self, table: &str, id: &str, row: Row) -> Result<Row, BackendError> {
        let mut qb = Self::update_query(table, id, row)?;
        qb.build_query_scalar::<Json<Row>>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .map(|Json(row)| row)
            .ok_or(BackendError::NotFound)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        let mut qb = Self::delete_query(table, id)?;
        qb.build()
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    /// A pooled connection carries no end-user identity.
    async fn session(&self) -> Result<Option<Session>, BackendError> {
        Ok(None)
    }
}

pub fn map_sqlx_error(err: sqlx::Error) -> BackendError {
    match err {
        sqlx::Error::RowNotFound => BackendError::NotFound,
        sqlx::Error::Database(db) => BackendError::from_persistence(db.message()),
        err @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
            BackendError::transport(err)
        }
        other => BackendError::from_persistence(other),
    }
}
