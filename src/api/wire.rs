//! Request and response bodies of the task REST API.

use serde::{Deserialize, Serialize};

use crate::model::task::null_as_default;
use crate::model::{Board, NewTask, Priority};

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// One row of a bulk ordering update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortUpdate {
    pub task_id: String,
    pub sort_index: i64,
    pub container_id: String,
}

/// Body of `PATCH /tasks/bulk-sort-update`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSortUpdate {
    pub updates: Vec<SortUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSortUpdateResponse {
    #[serde(default)]
    pub modified_count: u64,
    #[serde(default)]
    pub tasks: Vec<NewTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOrder {
    pub task_id: String,
    pub sort_index: i64,
}

/// Body of `PATCH /tasks/container/:id/reorder`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReorder {
    pub task_orders: Vec<TaskOrder>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReorderResponse {
    #[serde(default)]
    pub modified_count: u64,
    #[serde(default)]
    pub container_id: String,
}

/// Every task on the board, containers in display order and tasks in array
/// order within each.
pub fn bulk_sort_payload(board: &Board) -> BulkSortUpdate {
    let updates = board
        .containers
        .values()
        .flat_map(|container| {
            board.tasks_in(&container.id).into_iter().map(move |task| SortUpdate {
                task_id: task.id.clone(),
                sort_index: task.sort_index,
                container_id: container.id.clone(),
            })
        })
        .collect();
    BulkSortUpdate { updates }
}

/// The tasks of one container in array order, or `None` for an unknown id
pub fn container_reorder_payload(board: &Board, container_id: &str) -> Option<ContainerReorder> {
    board.container(container_id)?;
    let task_orders = board
        .tasks_in(container_id)
        .into_iter()
        .map(|task| TaskOrder {
            task_id: task.id.clone(),
            sort_index: task.sort_index,
        })
        .collect();
    Some(ContainerReorder { task_orders })
}

// ---------------------------------------------------------------------------
// Tasks and sections
// ---------------------------------------------------------------------------

/// Body of `POST /tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    pub status: String,
    pub container_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub sort_index: i64,
}

/// Body of `PATCH /tasks/:id/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Body of `POST /sections`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSectionRequest {
    pub title: String,
    pub color: String,
}

/// A container as the sections endpoints describe it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
