use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::wire::*;
use super::{ApiError, BoardApi};
use crate::model::config::ApiConfig;
use crate::model::{BoardColumn, NewTask, Task};

/// reqwest-backed [`BoardApi`]
#[derive(Debug, Clone)]
pub struct HttpBoardApi {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBoardApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let invalid = || ApiError::InvalidBaseUrl(trimmed.to_string());
        let base_url = Url::parse(trimmed).map_err(|_| invalid())?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(invalid());
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(HttpBoardApi {
            http,
            base_url,
            token,
        })
    }

    /// Build a client from `[api]`, reading the token from its env var
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        HttpBoardApi::new(&config.base_url, config.token(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// The base url with `segments` appended, each one percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.url(segments)?;
        debug!(%method, %url, "request");
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(method, segments)?.json(body)).await
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self) -> Result<Vec<BoardColumn>, ApiError> {
        self.send(self.request(Method::GET, &["tasks", "board"])?).await
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<NewTask, ApiError> {
        self.send_json(Method::POST, &["tasks"], request).await
    }

    async fn update_task(&self, task: &Task) -> Result<NewTask, ApiError> {
        self.send_json(Method::PUT, &["tasks", task.id.as_str()], task)
            .await
    }

    async fn delete_task(&self, task_id: &str) -> Result<MessageResponse, ApiError> {
        self.send(self.request(Method::DELETE, &["tasks", task_id])?)
            .await
    }

    async fn update_task_status(&self, task_id: &str, status: &str) -> Result<NewTask, ApiError> {
        let body = UpdateStatusRequest {
            status: status.to_string(),
        };
        self.send_json(Method::PATCH, &["tasks", task_id, "status"], &body)
            .await
    }

    async fn bulk_sort_update(&self, payload: &BulkSortUpdate) -> Result<BulkSortUpdateResponse, ApiError> {
        self.send_json(Method::PATCH, &["tasks", "bulk-sort-update"], payload)
            .await
    }

    async fn reorder_container(
        &self,
        container_id: &str,
        payload: &ContainerReorder,
    ) -> Result<ContainerReorderResponse, ApiError> {
        self.send_json(
            Method::PATCH,
            &["tasks", "container", container_id, "reorder"],
            payload,
        )
        .await
    }

    async fn create_section(&self, request: &CreateSectionRequest) -> Result<Section, ApiError> {
        self.send_json(Method::POST, &["sections"], request).await
    }

    async fn delete_section(&self, section_id: &str) -> Result<MessageResponse, ApiError> {
        self.send(self.request(Method::DELETE, &["sections", section_id])?)
            .await
    }
}
