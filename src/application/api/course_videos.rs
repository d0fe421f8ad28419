use crate::application::error::ApiError;
use crate::application::repos::RecordQuery;
use crate::domain::entities::CourseVideo;
use crate::domain::fields::SortKey;

use super::{ApiResponse, EntityApi};

fn course_query(course_id: &str) -> RecordQuery {
    RecordQuery::new()
        .eq("course_id", course_id.to_owned())
        .order_by(SortKey::ascending("order_index"))
}

impl EntityApi<CourseVideo> {
    /// Videos of one course in lesson order.
    pub async fn by_course(&self, course_id: &str) -> Result<ApiResponse<Vec<CourseVideo>>, ApiError> {
        let videos = self.query(&course_query(course_id)).await?;
        Ok(ApiResponse::ok(videos))
    }

    pub async fn by_course_or_local(
        &self,
        course_id: &str,
    ) -> Result<ApiResponse<Vec<CourseVideo>>, ApiError> {
        let videos = self.query_or_local(&course_query(course_id)).await;
        Ok(ApiResponse::ok(videos))
    }
}
