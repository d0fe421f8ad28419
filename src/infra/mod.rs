//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod error;
pub mod rest;
pub mod telemetry;

use std::sync::Arc;

use tracing::info;

use crate::application::repos::RecordStore;
use crate::config::BackendSettings;

use self::db::PostgresRecordStore;
use self::error::InfraError;
use self::rest::RestRecordStore;

/// Build the configured remote record store; `None` keeps the process local.
pub async fn connect(
    backend: Option<&BackendSettings>,
) -> Result<Option<Arc<dyn RecordStore>>, InfraError> {
    let Some(backend) = backend else {
        info!("no backend configured, using local store");
        return Ok(None);
    };

    let store: Arc<dyn RecordStore> = match backend {
        BackendSettings::Rest(rest) => {
            info!(url = %rest.url, "connecting REST record store");
            Arc::new(RestRecordStore::new(rest)?)
        }
        BackendSettings::Postgres(pg) => {
            info!(max_connections = pg.max_connections.get(), "connecting postgres record store");
            let pool = PostgresRecordStore::connect(&pg.url, pg.max_connections.get()).await?;
            let store = PostgresRecordStore::new(pool);
            store.health_check().await?;
            Arc::new(store)
        }
    };
    Ok(Some(store))
}
