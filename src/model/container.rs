use serde::{Deserialize, Serialize};

use super::task::null_as_default;

/// A board column. `task_ids` order is the ordering contract; task sort
/// indices are kept consistent with it after every structural change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

impl Container {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Container {
            id: id.into(),
            title: title.into(),
            color: String::new(),
            task_ids: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }

    /// Position of a task in this container
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.task_ids.iter().position(|id| id == task_id)
    }
}

/// A container about to be added (as returned by `POST /sections`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContainer {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
}

impl NewContainer {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        NewContainer {
            id: id.into(),
            title: title.into(),
            color: String::new(),
        }
    }
}
