//! The task REST API as the sync layer and the CLI consume it.

pub mod http;
pub mod wire;

use async_trait::async_trait;

use crate::model::{BoardColumn, NewTask, Task};

pub use http::HttpBoardApi;
pub use wire::*;

/// Error type for API calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unauthorized: missing or expired token")]
    Unauthorized,
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Whether sending the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Backend operations used by the board.
///
/// Task bodies in responses are decoded leniently as [`NewTask`] since the
/// server may omit engine-owned fields.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// `GET /tasks/board`
    async fn fetch_board(&self) -> Result<Vec<BoardColumn>, ApiError>;

    /// `POST /tasks`
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<NewTask, ApiError>;

    /// `PUT /tasks/:id` with the full task
    async fn update_task(&self, task: &Task) -> Result<NewTask, ApiError>;

    /// `DELETE /tasks/:id`
    async fn delete_task(&self, task_id: &str) -> Result<MessageResponse, ApiError>;

    /// `PATCH /tasks/:id/status`
    async fn update_task_status(&self, task_id: &str, status: &str) -> Result<NewTask, ApiError>;

    /// `PATCH /tasks/bulk-sort-update`
    async fn bulk_sort_update(&self, payload: &BulkSortUpdate) -> Result<BulkSortUpdateResponse, ApiError>;

    /// `PATCH /tasks/container/:id/reorder`
    async fn reorder_container(
        &self,
        container_id: &str,
        payload: &ContainerReorder,
    ) -> Result<ContainerReorderResponse, ApiError>;

    /// `POST /sections`
    async fn create_section(&self, request: &CreateSectionRequest) -> Result<Section, ApiError>;

    /// `DELETE /sections/:id`
    async fn delete_section(&self, section_id: &str) -> Result<MessageResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_status(status), "{status}");
        }
        for status in [400, 401, 403, 404, 409, 422] {
            assert!(!is_retryable_status(status), "{status}");
        }
    }

    #[test]
    fn test_error_retryability() {
        let busy = ApiError::Status {
            status: 503,
            body: String::new(),
        };
        assert!(busy.is_retryable());
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::InvalidBaseUrl("ftp://x".into()).is_retryable());
    }
}
