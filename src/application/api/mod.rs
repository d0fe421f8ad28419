//! Entity facades: the single entry point for content reads and writes.
//!
//! A [`ContentApi`] is built once with either a remote record store or the
//! local fallback store, and every [`EntityApi`] it hands out routes through
//! that same [`Backend`]. Inputs are validated before any store sees them.

mod blog_posts;
mod booking_forms;
mod course_videos;

use std::marker::PhantomData;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::application::error::ApiError;
use crate::application::repos::{BackendError, RecordQuery, RecordStore, Session};
use crate::domain::entities::{
    BlogPost, BookingForm, Course, CourseVideo, EntityKind, Video, new_record_id,
};
use crate::domain::error::DomainError;
use crate::domain::inputs::Validate;
use crate::store::{Backend, LocalCollection, LocalStore, RemoteStoreAdapter, Subscription};

pub(crate) const METRIC_FALLBACK_READS: &str = "kaizen_local_fallback_reads_total";

/// Result envelope returned by every facade call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            success: true,
        }
    }
}

impl<T> ApiResponse<Option<T>> {
    /// `success` mirrors whether a record was found.
    pub fn found(data: Option<T>) -> Self {
        let success = data.is_some();
        Self { data, success }
    }
}

impl ApiResponse<()> {
    pub fn status(success: bool) -> Self {
        Self { data: (), success }
    }
}

/// Facade over one entity collection.
pub struct EntityApi<E> {
    backend: Backend,
    local: Arc<LocalStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityApi<E> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            local: Arc::clone(&self.local),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for EntityApi<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityApi")
            .field("backend", &self.backend.mode())
            .finish_non_exhaustive()
    }
}

impl<E: LocalCollection> EntityApi<E> {
    fn new(backend: Backend, local: Arc<LocalStore>) -> Self {
        Self {
            backend,
            local,
            _entity: PhantomData,
        }
    }

    #[instrument(skip(self, draft), fields(collection = %E::KIND, mode = self.backend.mode()))]
    pub async fn create(&self, draft: E::Draft) -> Result<ApiResponse<E>, ApiError> {
        draft.validate()?;
        if let Some((kind, parent_id)) = E::draft_parent(&draft) {
            self.ensure_parent(kind, parent_id)?;
        }

        let record = E::from_draft(new_record_id(), draft, OffsetDateTime::now_utc());
        let id = record.id().to_owned();
        let Some(stored) = self.backend.insert(record).await? else {
            let message = format!("{} record `{id}` already exists", E::KIND);
            return Err(DomainError::invariant(message).into());
        };
        info!(id = stored.id(), "record created");
        Ok(ApiResponse::ok(stored))
    }

    /// Shallow-merge `patch` into the record. `success` is `false` when the
    /// local store has no record with `id`.
    #[instrument(skip(self, patch), fields(collection = %E::KIND, mode = self.backend.mode()))]
    pub async fn update(
        &self,
        id: &str,
        mut patch: E::Patch,
    ) -> Result<ApiResponse<Option<E>>, ApiError> {
        patch.validate()?;
        if let Some((kind, parent_id)) = E::patch_parent(&patch) {
            self.ensure_parent(kind, parent_id)?;
        }

        let now = OffsetDateTime::now_utc();
        E::prepare_patch(&mut patch, now);
        if self.backend.is_remote() && E::patch_depends_on_current(&patch) {
            if let Some(current) = self.get(id).await?.data {
                current.retain_current(&mut patch);
            }
        }
        let updated = self.backend.update::<E>(id, patch, now).await?;
        if updated.is_none() {
            debug!("update matched no record");
        }
        Ok(ApiResponse::found(updated))
    }

    #[instrument(skip(self), fields(collection = %E::KIND, mode = self.backend.mode()))]
    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>, ApiError> {
        self.ensure_no_dependents(id)?;
        let removed = self.backend.delete::<E>(id).await?;
        Ok(ApiResponse::status(removed))
    }

    pub async fn all(&self) -> Result<ApiResponse<Vec<E>>, ApiError> {
        let records = self.backend.list_all::<E>().await?;
        Ok(ApiResponse::ok(records))
    }

    /// [`EntityApi::all`], answering from the local store if the backend fails.
    pub async fn all_or_local(&self) -> Result<ApiResponse<Vec<E>>, ApiError> {
        match self.backend.list_all::<E>().await {
            Ok(records) => Ok(ApiResponse::ok(records)),
            Err(err) => Ok(ApiResponse::ok(self.fallback(err, |local| local.all()))),
        }
    }

    /// Find one record by id.
    pub async fn get(&self, id: &str) -> Result<ApiResponse<Option<E>>, ApiError> {
        let query = RecordQuery::new().eq("id", id.to_owned()).limit(1);
        let record = self.query(&query).await?.into_iter().next();
        Ok(ApiResponse::found(record))
    }

    pub(crate) async fn query(&self, query: &RecordQuery) -> Result<Vec<E>, ApiError> {
        Ok(self.backend.list::<E>(query).await?)
    }

    pub(crate) async fn query_or_local(&self, query: &RecordQuery) -> Vec<E> {
        match self.backend.list::<E>(query).await {
            Ok(records) => records,
            Err(err) => self.fallback(err, |local| local.query(query)),
        }
    }

    fn fallback<F>(&self, err: BackendError, read: F) -> Vec<E>
    where
        F: FnOnce(&LocalStore) -> Vec<E>,
    {
        counter!(METRIC_FALLBACK_READS, "collection" => E::KIND.table()).increment(1);
        warn!(
            collection = %E::KIND,
            error = %err,
            "remote read failed, serving local content"
        );
        read(&self.local)
    }

    /// Referential checks run against the local store only; a remote backend
    /// enforces its own foreign keys.
    fn ensure_parent(&self, kind: EntityKind, parent_id: &str) -> Result<(), DomainError> {
        if self.backend.is_remote() || self.local.contains(kind, parent_id) {
            return Ok(());
        }
        Err(DomainError::invariant(format!(
            "{} references missing {} record `{parent_id}`",
            E::KIND,
            kind
        )))
    }

    fn ensure_no_dependents(&self, id: &str) -> Result<(), DomainError> {
        if self.backend.is_remote() {
            return Ok(());
        }
        match self.local.dependents(E::KIND, id) {
            0 => Ok(()),
            count => Err(DomainError::invariant(format!(
                "{} record `{id}` is still referenced by {count} other record(s)",
                E::KIND
            ))),
        }
    }
}

/// Record counts shown on the analytics screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentTotals {
    pub courses: usize,
    pub videos: usize,
    pub blog_posts: usize,
}

/// Every entity facade, sharing one backend and one local store.
#[derive(Debug, Clone)]
pub struct ContentApi {
    backend: Backend,
    local: Arc<LocalStore>,
    blog_posts: EntityApi<BlogPost>,
    courses: EntityApi<Course>,
    course_videos: EntityApi<CourseVideo>,
    videos: EntityApi<Video>,
    booking_forms: EntityApi<BookingForm>,
}

impl ContentApi {
    /// Route to `remote` when configured, else to `local`. In remote mode
    /// `local` still backs the `*_or_local` degraded reads.
    pub fn new(remote: Option<Arc<dyn RecordStore>>, local: Arc<LocalStore>) -> Self {
        let backend = match remote {
            Some(store) => Backend::Remote(RemoteStoreAdapter::new(store)),
            None => Backend::Local(Arc::clone(&local)),
        };
        info!(mode = backend.mode(), "content backend selected");

        Self {
            blog_posts: EntityApi::new(backend.clone(), Arc::clone(&local)),
            courses: EntityApi::new(backend.clone(), Arc::clone(&local)),
            course_videos: EntityApi::new(backend.clone(), Arc::clone(&local)),
            videos: EntityApi::new(backend.clone(), Arc::clone(&local)),
            booking_forms: EntityApi::new(backend.clone(), Arc::clone(&local)),
            backend,
            local,
        }
    }

    pub fn local(local: Arc<LocalStore>) -> Self {
        Self::new(None, local)
    }

    pub fn remote(store: Arc<dyn RecordStore>, fallback: Arc<LocalStore>) -> Self {
        Self::new(Some(store), fallback)
    }

    pub fn is_remote(&self) -> bool {
        self.backend.is_remote()
    }

    pub fn blog_posts(&self) -> &EntityApi<BlogPost> {
        &self.blog_posts
    }

    pub fn courses(&self) -> &EntityApi<Course> {
        &self.courses
    }

    pub fn course_videos(&self) -> &EntityApi<CourseVideo> {
        &self.course_videos
    }

    pub fn videos(&self) -> &EntityApi<Video> {
        &self.videos
    }

    pub fn booking_forms(&self) -> &EntityApi<BookingForm> {
        &self.booking_forms
    }

    pub fn local_store(&self) -> &Arc<LocalStore> {
        &self.local
    }

    /// Register a change listener on the local store.
    ///
    /// Remote mutations do not notify; callers re-read after awaiting them.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.local.subscribe(listener)
    }

    pub async fn totals(&self) -> Result<ContentTotals, ApiError> {
        let (courses, videos, blog_posts) = tokio::try_join!(
            self.courses.all(),
            self.videos.all(),
            self.blog_posts.all()
        )?;
        Ok(ContentTotals {
            courses: courses.data.len(),
            videos: videos.data.len(),
            blog_posts: blog_posts.data.len(),
        })
    }

    /// Identity of the backend connection; `None` in local mode.
    pub async fn session(&self) -> Result<Option<Session>, ApiError> {
        Ok(self.backend.session().await?)
    }
}
