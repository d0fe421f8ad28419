//! The backend a [`ContentApi`](crate::application::api::ContentApi) routes to.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::application::repos::{BackendError, RecordQuery, Session};

use super::local::{LocalCollection, LocalStore};
use super::remote::RemoteStoreAdapter;

/// Chosen once when the facade is built; every call goes through it.
#[derive(Debug, Clone)]
pub enum Backend {
    Remote(RemoteStoreAdapter),
    Local(Arc<LocalStore>),
}

impl Backend {
    pub fn is_remote(&self) -> bool {
        matches!(self, Backend::Remote(_))
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Backend::Remote(_) => "remote",
            Backend::Local(_) => "local",
        }
    }

    /// Unfiltered listing: entity default order remotely, insertion order locally.
    pub async fn list_all<E: LocalCollection>(&self) -> Result<Vec<E>, BackendError> {
        match self {
            Backend::Remote(remote) => {
                remote
                    .list(&RecordQuery::new().order_by(E::DEFAULT_ORDER))
                    .await
            }
            Backend::Local(local) => Ok(local.all()),
        }
    }

    pub async fn list<E: LocalCollection>(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<E>, BackendError> {
        match self {
            Backend::Remote(remote) => remote.list(query).await,
            Backend::Local(local) => Ok(local.query(query)),
        }
    }

    /// `Ok(None)` only in local mode, when the id is already taken.
    pub async fn insert<E: LocalCollection>(&self, record: E) -> Result<Option<E>, BackendError> {
        match self {
            Backend::Remote(remote) => remote.insert(&record).await.map(Some),
            Backend::Local(local) => Ok(local.add(record)),
        }
    }

    /// `Ok(None)` only in local mode, for an unknown id.
    pub async fn update<E: LocalCollection>(
        &self,
        id: &str,
        patch: E::Patch,
        now: OffsetDateTime,
    ) -> Result<Option<E>, BackendError> {
        match self {
            Backend::Remote(remote) => remote.update::<E>(id, &patch, now).await.map(Some),
            Backend::Local(local) => Ok(local.update_record::<E>(id, patch)),
        }
    }

    /// `Ok(false)` only in local mode, for an unknown id.
    pub async fn delete<E: LocalCollection>(&self, id: &str) -> Result<bool, BackendError> {
        match self {
            Backend::Remote(remote) => remote.delete::<E>(id).await.map(|()| true),
            Backend::Local(local) => Ok(local.delete::<E>(id)),
        }
    }

    pub async fn session(&self) -> Result<Option<Session>, BackendError> {
        match self {
            Backend::Remote(remote) => remote.session().await,
            Backend::Local(_) => Ok(None),
        }
    }
}
