use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::container::Container;
use super::task::{NewTask, Task, null_as_default};

/// A column with its tasks inlined, in the shape served by
/// `GET /tasks/board`. Used to seed the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<NewTask>,
}

/// Normalized board state: containers in display order, tasks by id.
///
/// Container order is the `IndexMap` insertion order. A task is owned by
/// exactly one container: its `container_id` names that container and its
/// id appears once in that container's `task_ids`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub containers: IndexMap<String, Container>,
    pub tasks: HashMap<String, Task>,
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn is_container(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    pub fn is_task(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Resolve an id to a container: a container id maps to itself, a task
    /// id maps to the container hosting the task.
    pub fn find_container(&self, id: &str) -> Option<&Container> {
        if let Some(container) = self.containers.get(id) {
            return Some(container);
        }
        let task = self.tasks.get(id)?;
        self.containers.get(&task.container_id)
    }

    /// Tasks of a container in display order
    pub fn tasks_in(&self, container_id: &str) -> Vec<&Task> {
        self.containers
            .get(container_id)
            .map(|c| c.task_ids.iter().filter_map(|id| self.tasks.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}
