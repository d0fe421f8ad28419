//! Record store speaking the PostgREST dialect used by hosted Postgres services.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::application::repos::{
    BackendError, RecordQuery, RecordStore, Row, Session, validate_identifier,
};
use crate::config::RestSettings;
use crate::domain::fields::Direction;

use super::error::InfraError;

const REST_PREFIX: &str = "rest/v1/";
const AUTH_USER_PATH: &str = "auth/v1/user";

#[derive(Clone)]
pub struct RestRecordStore {
    client: Client,
    base: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RestRecordStore {
    pub fn new(settings: &RestSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::configuration(format!("http client: {err}")))?;

        let mut base = settings.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client,
            base,
            api_key: settings.api_key.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("kaizen/", env!("CARGO_PKG_VERSION"))
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        let table = validate_identifier(table)?;
        self.base
            .join(REST_PREFIX)
            .and_then(|rest| rest.join(table))
            .map_err(BackendError::encode)
    }

    /// `GET` URL for `query`: `select=*`, `col=eq.value`, `order=col.dir`, `limit=n`.
    pub(crate) fn query_url(&self, table: &str, query: &RecordQuery) -> Result<Url, BackendError> {
        let mut url = self.table_url(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for filter in &query.filters {
                let column = validate_identifier(&filter.column)?;
                let condition = match filter.value.to_query_text() {
                    Some(value) => format!("eq.{value}"),
                    None => "is.null".to_owned(),
                };
                pairs.append_pair(column, &condition);
            }
            if let Some(order) = &query.order {
                let column = validate_identifier(&order.column)?;
                let direction = match order.direction {
                    Direction::Ascending => "asc",
                    Direction::Descending => "desc",
                };
                pairs.append_pair("order", &format!("{column}.{direction}"));
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    pub(crate) fn record_url(&self, table: &str, id: &str) -> Result<Url, BackendError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    async fn send(request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(BackendError::transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(rejection(status, &body))
    }

    async fn rows(response: Response) -> Result<Vec<Row>, BackendError> {
        response
            .json::<Vec<Row>>()
            .await
            .map_err(BackendError::decode)
    }
}

impl std::fmt::Debug for RestRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRecordStore")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Row>, BackendError> {
        let url = self.query_url(table, query)?;
        debug!(%url, "rest query");
        let response = Self::send(self.request(Method::GET, url)).await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        let url = self.table_url(table)?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = Self::send(request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::decode("insert returned no representation"))
    }

    async fn update(&self, table: &str, id: &str, row: Row) -> Result<Row, BackendError> {
        let url = self.record_url(table, id)?;
        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = Self::send(request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(BackendError::NotFound)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        let url = self.record_url(table, id)?;
        Self::send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// Only a user access token identifies someone; the anon key does not.
    async fn session(&self) -> Result<Option<Session>, BackendError> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let url = self
            .base
            .join(AUTH_USER_PATH)
            .map_err(BackendError::encode)?;

        match Self::send(self.request(Method::GET, url)).await {
            Ok(response) => {
                let user = response
                    .json::<AuthUser>()
                    .await
                    .map_err(BackendError::decode)?;
                Ok(Some(Session {
                    user_id: user.id,
                    email: user.email,
                }))
            }
            Err(BackendError::Rejected { status: 401, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// PostgREST errors carry a JSON `message`; fall back to the raw body.
fn rejection(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned());
    BackendError::rejected(status.as_u16(), message)
}
