//! Create and update payloads, validated before they reach a store.
//!
//! Drafts carry the fields a caller supplies for a new record. Patches carry
//! a partial update: `None` leaves a field untouched, and nullable columns use
//! `Option<Option<T>>` so `Some(None)` clears them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;
use url::Url;

use crate::domain::error::DomainError;

pub trait Validate {
    fn validate(&self) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub is_published: bool,
    pub featured_image_url: Option<String>,
    pub tags: Vec<String>,
}

impl Validate for BlogPostDraft {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)?;
        require_text("author", &self.author)?;
        optional_url("featured_image_url", self.featured_image_url.as_deref())?;
        tags("tags", &self.tags)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub featured_image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Derived from `is_published` when the patch is applied; caller values are replaced.
    #[serde(
        skip_serializing_if = "Option::is_none",
        skip_deserializing,
        serialize_with = "nullable_timestamp"
    )]
    pub published_at: Option<Option<OffsetDateTime>>,
}

impl Validate for BlogPostPatch {
    fn validate(&self) -> Result<(), DomainError> {
        present_text("title", self.title.as_deref())?;
        present_text("content", self.content.as_deref())?;
        present_text("author", self.author.as_deref())?;
        if let Some(url) = &self.featured_image_url {
            optional_url("featured_image_url", url.as_deref())?;
        }
        if let Some(values) = &self.tags {
            tags("tags", values)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub lessons_count: i32,
    pub is_premium: bool,
    pub thumbnail_url: Option<String>,
    pub order_index: i32,
}

impl Validate for CourseDraft {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("title", &self.title)?;
        non_negative("lessons_count", self.lessons_count.into())?;
        non_negative("order_index", self.order_index.into())?;
        optional_url("thumbnail_url", self.thumbnail_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lessons_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub thumbnail_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
}

impl Validate for CoursePatch {
    fn validate(&self) -> Result<(), DomainError> {
        present_text("title", self.title.as_deref())?;
        if let Some(count) = self.lessons_count {
            non_negative("lessons_count", count.into())?;
        }
        if let Some(index) = self.order_index {
            non_negative("order_index", index.into())?;
        }
        if let Some(url) = &self.thumbnail_url {
            optional_url("thumbnail_url", url.as_deref())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseVideoDraft {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration: String,
    pub order_index: i32,
    pub is_preview: bool,
}

impl Validate for CourseVideoDraft {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("course_id", &self.course_id)?;
        require_text("title", &self.title)?;
        require_url("video_url", &self.video_url)?;
        non_negative("order_index", self.order_index.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseVideoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_preview: Option<bool>,
}

impl Validate for CourseVideoPatch {
    fn validate(&self) -> Result<(), DomainError> {
        present_text("course_id", self.course_id.as_deref())?;
        present_text("title", self.title.as_deref())?;
        if let Some(url) = &self.video_url {
            require_url("video_url", url)?;
        }
        if let Some(index) = self.order_index {
            non_negative("order_index", index.into())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoDraft {
    pub title: String,
    pub description: String,
    pub youtube_id: String,
    pub category: String,
    pub duration: String,
    pub is_premium: bool,
    pub thumbnail_url: Option<String>,
}

impl Validate for VideoDraft {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("title", &self.title)?;
        require_text("youtube_id", &self.youtube_id)?;
        require_text("category", &self.category)?;
        optional_url("thumbnail_url", self.thumbnail_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub thumbnail_url: Option<Option<String>>,
}

impl Validate for VideoPatch {
    fn validate(&self) -> Result<(), DomainError> {
        present_text("title", self.title.as_deref())?;
        present_text("youtube_id", self.youtube_id.as_deref())?;
        present_text("category", self.category.as_deref())?;
        if let Some(views) = self.views_count {
            non_negative("views_count", views)?;
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(DomainError::validation(
                    "rating",
                    "must be between 0.0 and 5.0",
                ));
            }
        }
        if let Some(url) = &self.thumbnail_url {
            optional_url("thumbnail_url", url.as_deref())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingFormDraft {
    pub coach_name: String,
    pub form_url: String,
    pub is_active: bool,
}

impl Validate for BookingFormDraft {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("coach_name", &self.coach_name)?;
        require_url("form_url", &self.form_url)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingFormPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coach_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for BookingFormPatch {
    fn validate(&self) -> Result<(), DomainError> {
        present_text("coach_name", self.coach_name.as_deref())?;
        if let Some(url) = &self.form_url {
            require_url("form_url", url)?;
        }
        Ok(())
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn present_text(field: &'static str, value: Option<&str>) -> Result<(), DomainError> {
    value.map_or(Ok(()), |value| require_text(field, value))
}

fn require_url(field: &'static str, value: &str) -> Result<(), DomainError> {
    let url = Url::parse(value.trim())
        .map_err(|err| DomainError::validation(field, format!("not a valid URL: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(DomainError::validation(
            field,
            format!("unsupported URL scheme `{scheme}`"),
        )),
    }
}

fn optional_url(field: &'static str, value: Option<&str>) -> Result<(), DomainError> {
    value.map_or(Ok(()), |value| require_url(field, value))
}

fn non_negative(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(())
}

fn tags(field: &'static str, values: &[String]) -> Result<(), DomainError> {
    if values.iter().any(|tag| tag.trim().is_empty()) {
        return Err(DomainError::validation(field, "tags must not be blank"));
    }
    Ok(())
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing key (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn nullable_timestamp<S>(
    value: &Option<Option<OffsetDateTime>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(Some(timestamp)) => time::serde::rfc3339::serialize(timestamp, serializer),
        _ => serializer.serialize_none(),
    }
}
