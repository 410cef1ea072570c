use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decode an explicit `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Task priority as the server spells it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            _ => Err(format!(
                "unknown priority '{}' (expected: high, normal, low)",
                s
            )),
        }
    }
}

/// A user assigned to a task.
///
/// The board endpoint returns populated profiles, while task creation
/// responses carry bare user ids. Both shapes are accepted and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignee {
    Profile(AssigneeProfile),
    Id(String),
}

impl Assignee {
    pub fn id(&self) -> &str {
        match self {
            Assignee::Profile(p) => &p.id,
            Assignee::Id(id) => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Assignee::Profile(p) => &p.name,
            Assignee::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeProfile {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A task on the board.
///
/// `container_id` and `sort_index` are owned by the ordering engine; the
/// remaining fields are opaque payload carried for rendering and for
/// round-tripping through `PUT /tasks/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignees: Vec<Assignee>,
    /// Mirrors the owning container's title
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub container_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort_index: i64,
    /// Server fields the engine does not interpret (likes, timeTracked, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Create a bare task with default payload fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::Normal,
            assignees: Vec::new(),
            status: String::new(),
            container_id: String::new(),
            sort_index: 0,
            extra: Map::new(),
        }
    }
}

/// A task record that is not on the board yet: an entry of the board
/// fetch, a creation response, or a locally built task. Engine-owned
/// fields may be absent and are filled in when the task is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignees: Vec<Assignee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        NewTask {
            id: id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::Normal,
            assignees: Vec::new(),
            status: None,
            container_id: None,
            sort_index: None,
            extra: Map::new(),
        }
    }

    pub fn with_sort_index(mut self, sort_index: i64) -> Self {
        self.sort_index = Some(sort_index);
        self
    }

    /// Place the record into a container. The container's title becomes
    /// the status when the record has none; `fallback_sort_index` is used
    /// when the record carries no key.
    pub fn into_task(self, container_id: &str, container_title: &str, fallback_sort_index: i64) -> Task {
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| container_title.to_string());
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            assignees: self.assignees,
            status,
            container_id: container_id.to_string(),
            sort_index: self.sort_index.unwrap_or(fallback_sort_index),
            extra: self.extra,
        }
    }
}

impl From<Task> for NewTask {
    fn from(task: Task) -> Self {
        NewTask {
            id: task.id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            assignees: task.assignees,
            status: Some(task.status),
            container_id: Some(task.container_id),
            sort_index: Some(task.sort_index),
            extra: task.extra,
        }
    }
}

/// Shallow field update for a task. `None` leaves a field untouched;
/// `Some(None)` on an optional field clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub assignees: Option<Vec<Assignee>>,
    pub status: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Merge the patch into `task`. Returns whether any field changed.
    pub fn apply_to(&self, task: &mut Task) -> bool {
        let before = task.clone();
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignees) = &self.assignees {
            task.assignees = assignees.clone();
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
        *task != before
    }
}
