use crate::application::error::ApiError;
use crate::application::repos::RecordQuery;
use crate::domain::entities::BlogPost;
use crate::domain::fields::SortKey;

use super::{ApiResponse, EntityApi};

fn published_query() -> RecordQuery {
    RecordQuery::new()
        .eq("is_published", true)
        .order_by(SortKey::descending("published_at"))
}

impl EntityApi<BlogPost> {
    /// Published posts, newest publication first.
    pub async fn published(&self) -> Result<ApiResponse<Vec<BlogPost>>, ApiError> {
        let posts = self.query(&published_query()).await?;
        Ok(ApiResponse::ok(posts))
    }

    pub async fn published_or_local(&self) -> Result<ApiResponse<Vec<BlogPost>>, ApiError> {
        let posts = self.query_or_local(&published_query()).await;
        Ok(ApiResponse::ok(posts))
    }

    /// A single post, only if it is published.
    pub async fn published_post(&self, id: &str) -> Result<ApiResponse<Option<BlogPost>>, ApiError> {
        let query = RecordQuery::new()
            .eq("id", id.to_owned())
            .eq("is_published", true)
            .limit(1);
        let post = self.query(&query).await?.into_iter().next();
        Ok(ApiResponse::found(post))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::api::ContentApi;
    use crate::domain::inputs::BlogPostPatch;
    use crate::store::LocalStore;

    fn demo_api() -> ContentApi {
        ContentApi::local(Arc::new(LocalStore::with_demo_content()))
    }

    #[tokio::test]
    async fn published_filters_and_sorts_locally() {
        let api = demo_api();
        let published = api.blog_posts().published().await.expect("published");

        let ids: Vec<_> = published.data.iter().map(|post| post.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert!(published.data.iter().all(|post| post.is_published));
    }

    #[tokio::test]
    async fn publishing_sets_and_clears_publication_time() {
        let api = demo_api();

        let published = api
            .blog_posts()
            .update(
                "3",
                BlogPostPatch {
                    is_published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .expect("update succeeds");
        let post = published.data.expect("post exists");
        assert!(post.published_at.is_some());

        let ids: Vec<_> = api
            .blog_posts()
            .published()
            .await
            .expect("published")
            .data
            .into_iter()
            .map(|post| post.id)
            .collect();
        assert_eq!(ids.first().map(String::as_str), Some("3"));

        let unpublished = api
            .blog_posts()
            .update(
                "3",
                BlogPostPatch {
                    is_published: Some(false),
                    ..Default::default()
                },
            )
            .await
            .expect("update succeeds");
        assert_eq!(unpublished.data.expect("post exists").published_at, None);
    }

    #[tokio::test]
    async fn retitling_keeps_publication_time() {
        let api = demo_api();
        let before = api.local_store().find::<BlogPost>("1").expect("seeded");

        let after = api
            .blog_posts()
            .update(
                "1",
                BlogPostPatch {
                    title: Some("Lean Six Sigma, revisited".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("update succeeds")
            .data
            .expect("post exists");

        assert_eq!(after.published_at, before.published_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn resaving_a_published_post_keeps_its_place() {
        let api = demo_api();
        let before = api.local_store().find::<BlogPost>("1").expect("seeded");

        let after = api
            .blog_posts()
            .update(
                "1",
                BlogPostPatch {
                    is_published: Some(true),
                    excerpt: Some("Edited excerpt".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("update succeeds")
            .data
            .expect("post exists");
        assert_eq!(after.published_at, before.published_at);

        let ids: Vec<_> = api
            .blog_posts()
            .published()
            .await
            .expect("published")
            .data
            .into_iter()
            .map(|post| post.id)
            .collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[tokio::test]
    async fn drafts_are_not_served_as_published_posts() {
        let api = demo_api();
        assert!(api.blog_posts().published_post("1").await.expect("read").success);

        let draft = api.blog_posts().published_post("3").await.expect("read");
        assert!(!draft.success);
        assert_eq!(draft.data, None);
    }
}
