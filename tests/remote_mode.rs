use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use kaizen::application::api::ContentApi;
use kaizen::application::error::ApiError;
use kaizen::application::repos::{BackendError, RecordQuery, RecordStore, Row, Session};
use kaizen::domain::inputs::{
    BlogPostDraft, BlogPostPatch, BookingFormDraft, CourseDraft, CoursePatch, CourseVideoDraft,
};
use kaizen::store::LocalStore;

/// Record store keeping rows in memory and evaluating queries on JSON values.
#[derive(Default)]
struct MemoryRecordStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    queries: Mutex<Vec<(String, RecordQuery)>>,
}

impl MemoryRecordStore {
    fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .expect("tables lock")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn last_query(&self) -> Option<(String, RecordQuery)> {
        self.queries.lock().expect("queries lock").last().cloned()
    }
}

fn compare_json(left: &Value, right: &Value) -> CmpOrdering {
    match (left, right) {
        (Value::Null, Value::Null) => CmpOrdering::Equal,
        (Value::Null, _) => CmpOrdering::Greater,
        (_, Value::Null) => CmpOrdering::Less,
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => CmpOrdering::Equal,
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Row>, BackendError> {
        self.queries
            .lock()
            .expect("queries lock")
            .push((table.to_string(), query.clone()));

        let mut rows: Vec<Row> = self
            .rows(table)
            .into_iter()
            .filter(|row| {
                query.filters.iter().all(|filter| {
                    let value = row.get(filter.column.as_ref()).unwrap_or(&Value::Null);
                    *value == filter.value.to_json()
                })
            })
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let a = a.get(order.column.as_ref()).unwrap_or(&Value::Null);
                let b = b.get(order.column.as_ref()).unwrap_or(&Value::Null);
                let ordering = compare_json(a, b);
                if order.is_ascending() {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        self.tables
            .lock()
            .expect("tables lock")
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, row: Row) -> Result<Row, BackendError> {
        let mut tables = self.tables.lock().expect("tables lock");
        let stored = tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|existing| existing.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or(BackendError::NotFound)?;
        stored.extend(row);
        Ok(stored.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        if let Some(rows) = self.tables.lock().expect("tables lock").get_mut(table) {
            rows.retain(|row| row.get("id").and_then(Value::as_str) != Some(id));
        }
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>, BackendError> {
        Ok(Some(Session {
            user_id: "admin-1".into(),
            email: Some("admin@example.com".into()),
        }))
    }
}

/// Record store whose every call fails like an unreachable host.
struct UnreachableRecordStore;

#[async_trait]
impl RecordStore for UnreachableRecordStore {
    async fn query(&self, _table: &str, _query: &RecordQuery) -> Result<Vec<Row>, BackendError> {
        Err(BackendError::transport("connection refused"))
    }

    async fn insert(&self, _table: &str, _row: Row) -> Result<Row, BackendError> {
        Err(BackendError::transport("connection refused"))
    }

    async fn update(&self, _table: &str, _id: &str, _row: Row) -> Result<Row, BackendError> {
        Err(BackendError::transport("connection refused"))
    }

    async fn delete(&self, _table: &str, _id: &str) -> Result<(), BackendError> {
        Err(BackendError::transport("connection refused"))
    }

    async fn session(&self) -> Result<Option<Session>, BackendError> {
        Err(BackendError::transport("connection refused"))
    }
}

fn remote_api() -> (Arc<MemoryRecordStore>, ContentApi) {
    let store = Arc::new(MemoryRecordStore::default());
    let api = ContentApi::remote(store.clone(), Arc::new(LocalStore::with_demo_content()));
    (store, api)
}

fn course(title: &str, order_index: i32) -> CourseDraft {
    CourseDraft {
        title: title.to_string(),
        description: "Remote course".to_string(),
        duration: "1h".to_string(),
        order_index,
        ..Default::default()
    }
}

#[tokio::test]
async fn remote_listing_sorts_by_default_order() {
    let (_store, api) = remote_api();
    assert!(api.is_remote());

    api.courses().create(course("A", 2)).await.expect("create A");
    api.courses().create(course("B", 1)).await.expect("create B");

    let titles: Vec<String> = api
        .courses()
        .all()
        .await
        .expect("list")
        .data
        .into_iter()
        .map(|course| course.title)
        .collect();
    assert_eq!(titles, ["B", "A"]);
}

#[tokio::test]
async fn remote_mutations_do_not_notify() {
    let (store, api) = remote_api();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let _subscription = api.subscribe(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let created = api
        .booking_forms()
        .create(BookingFormDraft {
            coach_name: "Rinesh".into(),
            form_url: "https://forms.example.com/rinesh".into(),
            is_active: true,
        })
        .await
        .expect("create form");
    api.booking_forms()
        .set_active(&created.data.id, false)
        .await
        .expect("deactivate");
    let removed = api
        .booking_forms()
        .delete(&created.data.id)
        .await
        .expect("delete");

    assert!(removed.success);
    assert!(store.rows("booking_forms").is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.local_store().len::<kaizen::domain::entities::BookingForm>(), 3);
}

#[tokio::test]
async fn remote_update_of_missing_record_is_an_error() {
    let (_store, api) = remote_api();
    let err = api
        .courses()
        .update(
            "missing",
            CoursePatch {
                is_premium: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect_err("backend reports not found");
    assert!(matches!(err, ApiError::Backend(BackendError::NotFound)));
}

#[tokio::test]
async fn remote_update_sends_only_changed_columns() {
    let (store, api) = remote_api();
    let created = api.courses().create(course("Kanban", 0)).await.expect("create");

    let updated = api
        .courses()
        .update(
            &created.data.id,
            CoursePatch {
                lessons_count: Some(9),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .data
        .expect("record returned");
    assert_eq!(updated.lessons_count, 9);
    assert_eq!(updated.title, "Kanban");
    assert!(updated.updated_at >= created.data.updated_at);

    let rows = store.rows("courses");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("lessons_count"), Some(&Value::from(9)));
}

#[tokio::test]
async fn republishing_does_not_resend_publication_time() {
    let (store, api) = remote_api();
    let post = api
        .blog_posts()
        .create(BlogPostDraft {
            title: "Heijunka".into(),
            content: "Level the load.".into(),
            excerpt: "Levelling".into(),
            author: "Rinesh".into(),
            is_published: true,
            ..Default::default()
        })
        .await
        .expect("create post")
        .data;

    let updated = api
        .blog_posts()
        .update(
            &post.id,
            BlogPostPatch {
                is_published: Some(true),
                title: Some("Heijunka, levelled".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .data
        .expect("record returned");
    assert_eq!(updated.title, "Heijunka, levelled");
    assert_eq!(updated.published_at, post.published_at);

    let rows = store.rows("blog_posts");
    let expected = post.published_at.map(|at| {
        Value::from(at.format(&time::format_description::well_known::Rfc3339).expect("rfc3339"))
    });
    assert_eq!(rows[0].get("published_at").cloned(), expected);
}

#[tokio::test]
async fn remote_deletes_leave_integrity_to_the_backend() {
    let (store, api) = remote_api();
    let course = api.courses().create(course("Jidoka", 0)).await.expect("course").data;
    api.course_videos()
        .create(CourseVideoDraft {
            course_id: course.id.clone(),
            title: "Stop the line".into(),
            video_url: "https://videos.example.com/jidoka.mp4".into(),
            ..Default::default()
        })
        .await
        .expect("course video");

    let removed = api.courses().delete(&course.id).await.expect("delete");
    assert!(removed.success);
    assert!(store.rows("courses").is_empty());
}

#[tokio::test]
async fn filtered_reads_issue_matching_queries() {
    let (store, api) = remote_api();
    let course = api.courses().create(course("5S", 0)).await.expect("course").data;
    for (title, order_index) in [("Shine", 2), ("Sort", 0), ("Set in order", 1)] {
        api.course_videos()
            .create(CourseVideoDraft {
                course_id: course.id.clone(),
                title: title.into(),
                video_url: format!("https://videos.example.com/{order_index}.mp4"),
                order_index,
                ..Default::default()
            })
            .await
            .expect("course video");
    }

    let titles: Vec<String> = api
        .course_videos()
        .by_course(&course.id)
        .await
        .expect("by course")
        .data
        .into_iter()
        .map(|video| video.title)
        .collect();
    assert_eq!(titles, ["Sort", "Set in order", "Shine"]);

    let (table, query) = store.last_query().expect("query recorded");
    assert_eq!(table, "course_videos");
    assert_eq!(query.filters.len(), 1);
    assert_eq!(query.filters[0].column, "course_id");
    assert_eq!(
        query.order.as_ref().map(|order| order.column.as_ref()),
        Some("order_index")
    );
}

#[tokio::test]
async fn remote_failures_propagate() {
    let api = ContentApi::remote(
        Arc::new(UnreachableRecordStore),
        Arc::new(LocalStore::with_demo_content()),
    );

    let err = api.videos().all().await.expect_err("transport failure");
    assert!(matches!(err, ApiError::Backend(BackendError::Transport(_))));

    let err = api
        .courses()
        .create(course("Poka-yoke", 0))
        .await
        .expect_err("insert fails");
    assert!(matches!(err, ApiError::Backend(_)));
    assert!(api.totals().await.is_err());
}

#[tokio::test]
async fn degraded_reads_fall_back_to_local_content() {
    let api = ContentApi::remote(
        Arc::new(UnreachableRecordStore),
        Arc::new(LocalStore::with_demo_content()),
    );

    let courses = api.courses().all_or_local().await.expect("fallback");
    assert!(courses.success);
    assert_eq!(courses.data.len(), 3);

    let posts = api
        .blog_posts()
        .published_or_local()
        .await
        .expect("fallback")
        .data;
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|post| post.is_published));

    let videos = api
        .course_videos()
        .by_course_or_local("1")
        .await
        .expect("fallback")
        .data;
    let order: Vec<i32> = videos.iter().map(|video| video.order_index).collect();
    assert_eq!(order, [0, 1]);
}

#[tokio::test]
async fn session_comes_from_the_backend() {
    let (_store, api) = remote_api();
    let session = api.session().await.expect("session").expect("signed in");
    assert_eq!(session.user_id, "admin-1");
}
