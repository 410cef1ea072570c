//! In-memory `BoardApi` for sync tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::*;
use crate::model::{BoardColumn, NewTask, Task};

/// Records every ordering call. Queued failures are returned, one per
/// call, before calls start succeeding again.
#[derive(Debug, Default)]
pub struct FakeApi {
    bulk: Mutex<Vec<BulkSortUpdate>>,
    reorders: Mutex<Vec<(String, ContainerReorder)>>,
    failures: Mutex<VecDeque<u16>>,
}

impl FakeApi {
    pub fn fail_next(&self, status: u16) {
        self.failures.lock().unwrap().push_back(status);
    }

    pub fn bulk_calls(&self) -> Vec<BulkSortUpdate> {
        self.bulk.lock().unwrap().clone()
    }

    pub fn reorder_calls(&self) -> Vec<(String, ContainerReorder)> {
        self.reorders.lock().unwrap().clone()
    }

    fn next_failure(&self) -> Result<(), ApiError> {
        match self.failures.lock().unwrap().pop_front() {
            Some(status) => Err(ApiError::Status {
                status,
                body: "unavailable".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BoardApi for FakeApi {
    async fn fetch_board(&self) -> Result<Vec<BoardColumn>, ApiError> {
        Ok(columns())
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<NewTask, ApiError> {
        Ok(NewTask::new("new", request.title.clone()))
    }

    async fn update_task(&self, task: &Task) -> Result<NewTask, ApiError> {
        Ok(task.clone().into())
    }

    async fn delete_task(&self, _task_id: &str) -> Result<MessageResponse, ApiError> {
        Ok(MessageResponse::default())
    }

    async fn update_task_status(&self, task_id: &str, _status: &str) -> Result<NewTask, ApiError> {
        Ok(NewTask::new(task_id, task_id))
    }

    async fn bulk_sort_update(&self, payload: &BulkSortUpdate) -> Result<BulkSortUpdateResponse, ApiError> {
        self.bulk.lock().unwrap().push(payload.clone());
        self.next_failure()?;
        Ok(BulkSortUpdateResponse {
            modified_count: payload.updates.len() as u64,
            tasks: Vec::new(),
        })
    }

    async fn reorder_container(
        &self,
        container_id: &str,
        payload: &ContainerReorder,
    ) -> Result<ContainerReorderResponse, ApiError> {
        self.reorders
            .lock()
            .unwrap()
            .push((container_id.to_string(), payload.clone()));
        self.next_failure()?;
        Ok(ContainerReorderResponse {
            modified_count: payload.task_orders.len() as u64,
            container_id: container_id.to_string(),
        })
    }

    async fn create_section(&self, request: &CreateSectionRequest) -> Result<Section, ApiError> {
        Ok(Section {
            id: "section".into(),
            title: request.title.clone(),
            color: request.color.clone(),
        })
    }

    async fn delete_section(&self, _section_id: &str) -> Result<MessageResponse, ApiError> {
        Ok(MessageResponse::default())
    }
}

/// `todo: a b c`, `doing: d`, `done: (empty)`
pub fn columns() -> Vec<BoardColumn> {
    let column = |id: &str, title: &str, tasks: &[&str]| BoardColumn {
        id: id.into(),
        title: title.into(),
        color: String::new(),
        tasks: tasks.iter().map(|t| NewTask::new(*t, t.to_uppercase())).collect(),
    };
    vec![
        column("todo", "To-Do", &["a", "b", "c"]),
        column("doing", "Doing", &["d"]),
        column("done", "Done", &[]),
    ]
}
