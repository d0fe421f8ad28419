//! In-process fallback store used when no backend is configured.
//!
//! Collections live behind one mutex and keep insertion order. Every
//! successful mutation notifies the store's listeners once, after the lock
//! has been released, so listeners can read the store from inside the
//! callback. Nothing here survives a restart.

use std::sync::Mutex;

use metrics::counter;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::application::repos::RecordQuery;
use crate::domain::entities::{
    BlogPost, BookingForm, Course, CourseVideo, Entity, EntityKind, Video, new_record_id,
};
use crate::domain::seed::DemoContent;

use super::listeners::{ListenerRegistry, Subscription};
use super::lock::mutex_lock;

const SOURCE: &str = "store::local";

pub(crate) const METRIC_LOCAL_MUTATIONS: &str = "kaizen_local_mutations_total";
pub(crate) const METRIC_LOCAL_NOTIFICATIONS: &str = "kaizen_local_notifications_total";

/// The five local collections.
#[derive(Debug, Default)]
pub struct CollectionSet {
    blog_posts: Vec<BlogPost>,
    courses: Vec<Course>,
    course_videos: Vec<CourseVideo>,
    videos: Vec<Video>,
    booking_forms: Vec<BookingForm>,
}

impl CollectionSet {
    fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::BlogPost => self.blog_posts.iter().any(|r| r.id == id),
            EntityKind::Course => self.courses.iter().any(|r| r.id == id),
            EntityKind::CourseVideo => self.course_videos.iter().any(|r| r.id == id),
            EntityKind::Video => self.videos.iter().any(|r| r.id == id),
            EntityKind::BookingForm => self.booking_forms.iter().any(|r| r.id == id),
        }
    }

    fn dependents(&self, kind: EntityKind, id: &str) -> usize {
        match kind {
            EntityKind::Course => self
                .course_videos
                .iter()
                .filter(|video| video.course_id == id)
                .count(),
            _ => 0,
        }
    }
}

impl From<DemoContent> for CollectionSet {
    fn from(content: DemoContent) -> Self {
        Self {
            blog_posts: content.blog_posts,
            courses: content.courses,
            course_videos: content.course_videos,
            videos: content.videos,
            booking_forms: content.booking_forms,
        }
    }
}

/// Entities that have a collection in the local store.
pub trait LocalCollection: Entity {
    fn collection(set: &CollectionSet) -> &Vec<Self>;

    fn collection_mut(set: &mut CollectionSet) -> &mut Vec<Self>;
}

macro_rules! local_collection {
    ($entity:ty, $field:ident) => {
        impl LocalCollection for $entity {
            fn collection(set: &CollectionSet) -> &Vec<Self> {
                &set.$field
            }

            fn collection_mut(set: &mut CollectionSet) -> &mut Vec<Self> {
                &mut set.$field
            }
        }
    };
}

local_collection!(BlogPost, blog_posts);
local_collection!(Course, courses);
local_collection!(CourseVideo, course_videos);
local_collection!(Video, videos);
local_collection!(BookingForm, booking_forms);

#[derive(Debug, Default)]
pub struct LocalStore {
    collections: Mutex<CollectionSet>,
    listeners: ListenerRegistry,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo catalogue. Seeding does not notify.
    pub fn with_demo_content() -> Self {
        Self::from_content(DemoContent::new(OffsetDateTime::now_utc()))
    }

    pub fn from_content(content: DemoContent) -> Self {
        Self {
            collections: Mutex::new(content.into()),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Snapshot of the collection in insertion order.
    pub fn all<E: LocalCollection>(&self) -> Vec<E> {
        E::collection(&mutex_lock(&self.collections, SOURCE, "all")).clone()
    }

    pub fn filtered<E, P>(&self, predicate: P) -> Vec<E>
    where
        E: LocalCollection,
        P: Fn(&E) -> bool,
    {
        E::collection(&mutex_lock(&self.collections, SOURCE, "filtered"))
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Evaluate a backend-style query against the collection.
    pub fn query<E: LocalCollection>(&self, query: &RecordQuery) -> Vec<E> {
        let records = E::collection(&mutex_lock(&self.collections, SOURCE, "query")).clone();
        query.apply(records)
    }

    pub fn find<E: LocalCollection>(&self, id: &str) -> Option<E> {
        E::collection(&mutex_lock(&self.collections, SOURCE, "find"))
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    pub fn len<E: LocalCollection>(&self) -> usize {
        E::collection(&mutex_lock(&self.collections, SOURCE, "len")).len()
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        mutex_lock(&self.collections, SOURCE, "contains").contains(kind, id)
    }

    /// Number of records whose parent link points at `kind`/`id`.
    pub fn dependents(&self, kind: EntityKind, id: &str) -> usize {
        mutex_lock(&self.collections, SOURCE, "dependents").dependents(kind, id)
    }

    /// Append `record`, generating an id when it has none.
    ///
    /// `created_at` is kept as given; `updated_at` is stamped now. `None`
    /// when the collection already holds a record with the supplied id.
    pub fn add<E: LocalCollection>(&self, mut record: E) -> Option<E> {
        if record.id().is_empty() {
            record.assign_id(new_record_id());
        }
        record.touch(OffsetDateTime::now_utc());

        {
            let mut collections = mutex_lock(&self.collections, SOURCE, "add");
            let records = E::collection_mut(&mut collections);
            if records.iter().any(|existing| existing.id() == record.id()) {
                warn!(collection = %E::KIND, id = record.id(), "local add rejected duplicate id");
                return None;
            }
            records.push(record.clone());
        }

        info!(collection = %E::KIND, id = record.id(), "local record added");
        self.changed(E::KIND, "add");
        Some(record)
    }

    /// Merge `patch` into the record with `id`. `false` when absent.
    pub fn update<E: LocalCollection>(&self, id: &str, patch: E::Patch) -> bool {
        self.update_record::<E>(id, patch).is_some()
    }

    /// Like [`LocalStore::update`], returning the merged record.
    pub fn update_record<E: LocalCollection>(&self, id: &str, patch: E::Patch) -> Option<E> {
        let updated = {
            let mut collections = mutex_lock(&self.collections, SOURCE, "update");
            let record = E::collection_mut(&mut collections)
                .iter_mut()
                .find(|record| record.id() == id)?;
            record.merge(patch);
            record.touch(OffsetDateTime::now_utc());
            record.clone()
        };

        info!(collection = %E::KIND, id, "local record updated");
        self.changed(E::KIND, "update");
        Some(updated)
    }

    /// Remove the record with `id`. `false` when absent.
    pub fn delete<E: LocalCollection>(&self, id: &str) -> bool {
        let removed = {
            let mut collections = mutex_lock(&self.collections, SOURCE, "delete");
            let records = E::collection_mut(&mut collections);
            match records.iter().position(|record| record.id() == id) {
                Some(index) => {
                    records.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            info!(collection = %E::KIND, id, "local record deleted");
            self.changed(E::KIND, "delete");
        } else {
            debug!(collection = %E::KIND, id, "local delete matched no record");
        }
        removed
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn changed(&self, kind: EntityKind, op: &'static str) {
        counter!(METRIC_LOCAL_MUTATIONS, "collection" => kind.table(), "op" => op).increment(1);
        let invoked = self.listeners.notify();
        counter!(METRIC_LOCAL_NOTIFICATIONS).increment(1);
        debug!(collection = %kind, op, listeners = invoked, "change notification sent");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::macros::datetime;

    use super::*;
    use crate::domain::fields::SortKey;
    use crate::domain::inputs::{BookingFormPatch, CoursePatch};

    fn course(title: &str, order_index: i32) -> Course {
        let created = datetime!(2024-05-01 09:00:00 UTC);
        Course {
            id: String::new(),
            title: title.into(),
            description: "desc".into(),
            duration: "1 hour".into(),
            lessons_count: 3,
            is_premium: false,
            thumbnail_url: None,
            order_index,
            created_at: created,
            updated_at: created,
        }
    }

    fn hit_counter(store: &LocalStore) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&hits);
        let subscription = store.subscribe(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        });
        (hits, subscription)
    }

    #[test]
    fn add_generates_id_and_keeps_created_at() {
        let store = LocalStore::new();
        let added = store.add(course("Lean Basics", 1)).expect("fresh id");

        assert!(!added.id.is_empty());
        assert_eq!(added.created_at, datetime!(2024-05-01 09:00:00 UTC));
        assert!(added.updated_at > added.created_at);
        assert_eq!(store.all::<Course>(), vec![added]);
    }

    #[test]
    fn add_keeps_supplied_id() {
        let store = LocalStore::new();
        let mut record = course("DMAIC Process", 3);
        record.id = "dmaic".into();

        assert_eq!(store.add(record).map(|c| c.id).as_deref(), Some("dmaic"));
        assert!(store.contains(EntityKind::Course, "dmaic"));
        assert!(!store.contains(EntityKind::Video, "dmaic"));
    }

    #[test]
    fn add_rejects_an_id_already_in_use() {
        let store = LocalStore::with_demo_content();
        let (hits, _subscription) = hit_counter(&store);
        let mut clash = course("Duplicate", 9);
        clash.id = "1".into();

        assert_eq!(store.add(clash), None);
        let ids: Vec<_> = store.all::<Course>().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert!(store.delete::<Course>("1"));
        assert_eq!(store.find::<Course>("1"), None);
    }

    #[test]
    fn dependents_count_course_videos() {
        let store = LocalStore::with_demo_content();
        assert_eq!(store.dependents(EntityKind::Course, "1"), 2);
        assert_eq!(store.dependents(EntityKind::Course, "3"), 0);
        assert_eq!(store.dependents(EntityKind::Video, "1"), 0);
    }

    #[test]
    fn local_listing_keeps_insertion_order() {
        let store = LocalStore::new();
        store.add(course("A", 2)).expect("fresh id");
        store.add(course("B", 1)).expect("fresh id");

        let titles: Vec<_> = store.all::<Course>().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, ["A", "B"]);

        let sorted = store.query::<Course>(
            &RecordQuery::new().order_by(SortKey::ascending("order_index")),
        );
        let titles: Vec<_> = sorted.into_iter().map(|c| c.title).collect();
        assert_eq!(titles, ["B", "A"]);
    }

    #[test]
    fn update_merges_and_notifies_once() {
        let store = LocalStore::new();
        let added = store.add(course("Lean Basics", 1)).expect("fresh id");
        let (hits, _subscription) = hit_counter(&store);

        let updated = store
            .update_record::<Course>(
                &added.id,
                CoursePatch {
                    lessons_count: Some(12),
                    ..Default::default()
                },
            )
            .expect("record exists");

        assert_eq!(updated.lessons_count, 12);
        assert_eq!(updated.title, "Lean Basics");
        assert!(updated.updated_at >= added.updated_at);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_ids_neither_change_nor_notify() {
        let store = LocalStore::new();
        let (hits, _subscription) = hit_counter(&store);

        assert!(!store.delete::<BookingForm>("xyz"));
        assert!(!store.update::<BookingForm>("xyz", BookingFormPatch::default()));
        assert_eq!(store.len::<BookingForm>(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listeners_can_read_the_store() {
        let store = Arc::new(LocalStore::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let reader = Arc::clone(&store);
        let observed = Arc::clone(&seen);
        let _subscription = store.subscribe(move || {
            observed.store(reader.len::<Course>(), Ordering::SeqCst);
        });

        store.add(course("Lean Basics", 1)).expect("fresh id");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn demo_content_is_seeded_silently() {
        let store = LocalStore::with_demo_content();
        assert_eq!(store.len::<BlogPost>(), 3);
        assert_eq!(store.len::<Course>(), 3);
        assert_eq!(store.len::<CourseVideo>(), 2);
        assert_eq!(store.len::<Video>(), 2);
        assert_eq!(store.len::<BookingForm>(), 3);
        assert_eq!(store.listener_count(), 0);

        let premium = store.filtered::<Course, _>(|course| course.is_premium);
        assert_eq!(premium.len(), 1);
        assert_eq!(premium[0].title, "DMAIC Process");
        assert_eq!(
            store.find::<Video>("2").map(|video| video.category),
            Some("testimonials".to_string())
        );
    }
}
