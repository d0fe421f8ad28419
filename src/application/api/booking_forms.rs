use crate::application::error::ApiError;
use crate::application::repos::RecordQuery;
use crate::domain::entities::BookingForm;
use crate::domain::fields::SortKey;
use crate::domain::inputs::BookingFormPatch;

use super::{ApiResponse, EntityApi};

impl EntityApi<BookingForm> {
    /// Forms currently offered to clients, newest first.
    pub async fn active(&self) -> Result<ApiResponse<Vec<BookingForm>>, ApiError> {
        let query = RecordQuery::new()
            .eq("is_active", true)
            .order_by(SortKey::descending("created_at"));
        let forms = self.query(&query).await?;
        Ok(ApiResponse::ok(forms))
    }

    pub async fn set_active(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<ApiResponse<Option<BookingForm>>, ApiError> {
        self.update(
            id,
            BookingFormPatch {
                is_active: Some(is_active),
                ..Default::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::api::ContentApi;
    use crate::store::LocalStore;

    #[tokio::test]
    async fn toggling_moves_forms_in_and_out_of_active_set() {
        let api = ContentApi::local(Arc::new(LocalStore::with_demo_content()));
        let coaches = |forms: Vec<BookingForm>| -> Vec<String> {
            let mut names: Vec<_> = forms.into_iter().map(|form| form.coach_name).collect();
            names.sort();
            names
        };

        let active = api.booking_forms().active().await.expect("read").data;
        assert_eq!(coaches(active), ["Harsha Patel", "Rinesh Kumar"]);

        let toggled = api
            .booking_forms()
            .set_active("3", true)
            .await
            .expect("toggle succeeds");
        assert!(toggled.success);
        api.booking_forms()
            .set_active("1", false)
            .await
            .expect("toggle succeeds");

        let active = api.booking_forms().active().await.expect("read").data;
        assert_eq!(coaches(active), ["Divyanshu Singh", "Harsha Patel"]);

        let missing = api
            .booking_forms()
            .set_active("nope", true)
            .await
            .expect("missing form is not an error");
        assert!(!missing.success);
    }
}
