//! Content records and the contract every stored entity implements.

use std::fmt;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::fields::{FieldValue, SortKey};
use crate::domain::inputs::{
    BlogPostDraft, BlogPostPatch, BookingFormDraft, BookingFormPatch, CourseDraft, CoursePatch,
    CourseVideoDraft, CourseVideoPatch, Validate, VideoDraft, VideoPatch,
};

/// The five content collections, named after their backend tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BlogPost,
    Course,
    CourseVideo,
    Video,
    BookingForm,
}

impl EntityKind {
    pub const fn table(self) -> &'static str {
        match self {
            EntityKind::BlogPost => "blog_posts",
            EntityKind::Course => "courses",
            EntityKind::CourseVideo => "course_videos",
            EntityKind::Video => "videos",
            EntityKind::BookingForm => "booking_forms",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Generate a fresh record identifier (UUID v4 from the OS CSPRNG).
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Contract shared by every content record.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Caller-supplied fields for a new record.
    type Draft: Validate + fmt::Debug + DeserializeOwned + Send + Sync;
    /// Partial update; absent fields are left untouched.
    type Patch: Validate + fmt::Debug + Default + Serialize + DeserializeOwned + Send + Sync;

    const KIND: EntityKind;
    /// Sort key the remote backend applies to an unfiltered listing.
    const DEFAULT_ORDER: SortKey;

    fn from_draft(id: String, draft: Self::Draft, now: OffsetDateTime) -> Self;

    fn id(&self) -> &str;

    fn assign_id(&mut self, id: String);

    fn touch(&mut self, now: OffsetDateTime);

    /// Shallow merge: every field present in `patch` overwrites the record.
    fn merge(&mut self, patch: Self::Patch);

    /// Column lookup used by filters and sort keys; `None` for unknown columns.
    fn field(&self, column: &str) -> Option<FieldValue>;

    /// Fill in fields derived from other patch fields.
    fn prepare_patch(_patch: &mut Self::Patch, _now: OffsetDateTime) {}

    /// Whether [`Entity::retain_current`] needs the stored record for `patch`.
    fn patch_depends_on_current(_patch: &Self::Patch) -> bool {
        false
    }

    /// Drop derived patch fields that the stored record already settles.
    fn retain_current(&self, _patch: &mut Self::Patch) {}

    /// Parent record a draft points at, when the entity has one.
    fn draft_parent(_draft: &Self::Draft) -> Option<(EntityKind, &str)> {
        None
    }

    /// Parent record a patch re-points to, when it changes one.
    fn patch_parent(_patch: &Self::Patch) -> Option<(EntityKind, &str)> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub is_published: bool,
    #[serde(default)]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl Entity for BlogPost {
    type Draft = BlogPostDraft;
    type Patch = BlogPostPatch;

    const KIND: EntityKind = EntityKind::BlogPost;
    const DEFAULT_ORDER: SortKey = SortKey::descending("created_at");

    fn from_draft(id: String, draft: BlogPostDraft, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            excerpt: draft.excerpt,
            author: draft.author,
            is_published: draft.is_published,
            featured_image_url: draft.featured_image_url,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
            published_at: draft.is_published.then_some(now),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
    }

    fn merge(&mut self, mut patch: BlogPostPatch) {
        self.retain_current(&mut patch);
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            self.excerpt = excerpt;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        if let Some(url) = patch.featured_image_url {
            self.featured_image_url = url;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(published_at) = patch.published_at {
            self.published_at = published_at;
        }
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        let value: FieldValue = match column {
            "id" => self.id.as_str().into(),
            "title" => self.title.as_str().into(),
            "content" => self.content.as_str().into(),
            "excerpt" => self.excerpt.as_str().into(),
            "author" => self.author.as_str().into(),
            "is_published" => self.is_published.into(),
            "featured_image_url" => self.featured_image_url.clone().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "published_at" => self.published_at.into(),
            _ => return None,
        };
        Some(value)
    }

    /// `published_at` follows `is_published`: set to `now` when a patch
    /// publishes, cleared when it unpublishes, untouched otherwise.
    fn prepare_patch(patch: &mut BlogPostPatch, now: OffsetDateTime) {
        patch.published_at = patch
            .is_published
            .map(|is_published| is_published.then_some(now));
    }

    fn patch_depends_on_current(patch: &BlogPostPatch) -> bool {
        matches!(patch.published_at, Some(Some(_)))
    }

    /// Re-publishing an already published post keeps its original date.
    fn retain_current(&self, patch: &mut BlogPostPatch) {
        if self.is_published
            && self.published_at.is_some()
            && matches!(patch.published_at, Some(Some(_)))
        {
            patch.published_at = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub lessons_count: i32,
    pub is_premium: bool,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub order_index: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Entity for Course {
    type Draft = CourseDraft;
    type Patch = CoursePatch;

    const KIND: EntityKind = EntityKind::Course;
    const DEFAULT_ORDER: SortKey = SortKey::ascending("order_index");

    fn from_draft(id: String, draft: CourseDraft, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            duration: draft.duration,
            lessons_count: draft.lessons_count,
            is_premium: draft.is_premium,
            thumbnail_url: draft.thumbnail_url,
            order_index: draft.order_index,
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
    }

    fn merge(&mut self, patch: CoursePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(lessons_count) = patch.lessons_count {
            self.lessons_count = lessons_count;
        }
        if let Some(is_premium) = patch.is_premium {
            self.is_premium = is_premium;
        }
        if let Some(url) = patch.thumbnail_url {
            self.thumbnail_url = url;
        }
        if let Some(order_index) = patch.order_index {
            self.order_index = order_index;
        }
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        let value: FieldValue = match column {
            "id" => self.id.as_str().into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.as_str().into(),
            "duration" => self.duration.as_str().into(),
            "lessons_count" => self.lessons_count.into(),
            "is_premium" => self.is_premium.into(),
            "thumbnail_url" => self.thumbnail_url.clone().into(),
            "order_index" => self.order_index.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseVideo {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration: String,
    pub order_index: i32,
    pub is_preview: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Entity for CourseVideo {
    type Draft = CourseVideoDraft;
    type Patch = CourseVideoPatch;

    const KIND: EntityKind = EntityKind::CourseVideo;
    const DEFAULT_ORDER: SortKey = SortKey::ascending("order_index");

    fn from_draft(id: String, draft: CourseVideoDraft, now: OffsetDateTime) -> Self {
        Self {
            id,
            course_id: draft.course_id,
            title: draft.title,
            description: draft.description,
            video_url: draft.video_url,
            duration: draft.duration,
            order_index: draft.order_index,
            is_preview: draft.is_preview,
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
    }

    fn merge(&mut self, patch: CourseVideoPatch) {
        if let Some(course_id) = patch.course_id {
            self.course_id = course_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(video_url) = patch.video_url {
            self.video_url = video_url;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(order_index) = patch.order_index {
            self.order_index = order_index;
        }
        if let Some(is_preview) = patch.is_preview {
            self.is_preview = is_preview;
        }
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        let value: FieldValue = match column {
            "id" => self.id.as_str().into(),
            "course_id" => self.course_id.as_str().into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.as_str().into(),
            "video_url" => self.video_url.as_str().into(),
            "duration" => self.duration.as_str().into(),
            "order_index" => self.order_index.into(),
            "is_preview" => self.is_preview.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }

    fn draft_parent(draft: &CourseVideoDraft) -> Option<(EntityKind, &str)> {
        Some((EntityKind::Course, draft.course_id.as_str()))
    }

    fn patch_parent(patch: &CourseVideoPatch) -> Option<(EntityKind, &str)> {
        patch
            .course_id
            .as_deref()
            .map(|course_id| (EntityKind::Course, course_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub youtube_id: String,
    pub category: String,
    pub duration: String,
    #[serde(default)]
    pub views_count: i64,
    #[serde(default)]
    pub rating: f64,
    pub is_premium: bool,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Entity for Video {
    type Draft = VideoDraft;
    type Patch = VideoPatch;

    const KIND: EntityKind = EntityKind::Video;
    const DEFAULT_ORDER: SortKey = SortKey::descending("created_at");

    /// New videos always start with no views and no rating.
    fn from_draft(id: String, draft: VideoDraft, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            youtube_id: draft.youtube_id,
            category: draft.category,
            duration: draft.duration,
            views_count: 0,
            rating: 0.0,
            is_premium: draft.is_premium,
            thumbnail_url: draft.thumbnail_url,
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
    }

    fn merge(&mut self, patch: VideoPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(youtube_id) = patch.youtube_id {
            self.youtube_id = youtube_id;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(views_count) = patch.views_count {
            self.views_count = views_count;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(is_premium) = patch.is_premium {
            self.is_premium = is_premium;
        }
        if let Some(url) = patch.thumbnail_url {
            self.thumbnail_url = url;
        }
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        let value: FieldValue = match column {
            "id" => self.id.as_str().into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.as_str().into(),
            "youtube_id" => self.youtube_id.as_str().into(),
            "category" => self.category.as_str().into(),
            "duration" => self.duration.as_str().into(),
            "views_count" => self.views_count.into(),
            "rating" => self.rating.into(),
            "is_premium" => self.is_premium.into(),
            "thumbnail_url" => self.thumbnail_url.clone().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingForm {
    pub id: String,
    pub coach_name: String,
    pub form_url: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Entity for BookingForm {
    type Draft = BookingFormDraft;
    type Patch = BookingFormPatch;

    const KIND: EntityKind = EntityKind::BookingForm;
    const DEFAULT_ORDER: SortKey = SortKey::descending("created_at");

    fn from_draft(id: String, draft: BookingFormDraft, now: OffsetDateTime) -> Self {
        Self {
            id,
            coach_name: draft.coach_name,
            form_url: draft.form_url,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
    }

    fn merge(&mut self, patch: BookingFormPatch) {
        if let Some(coach_name) = patch.coach_name {
            self.coach_name = coach_name;
        }
        if let Some(form_url) = patch.form_url {
            self.form_url = form_url;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        let value: FieldValue = match column {
            "id" => self.id.as_str().into(),
            "coach_name" => self.coach_name.as_str().into(),
            "form_url" => self.form_url.as_str().into(),
            "is_active" => self.is_active.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }
}
