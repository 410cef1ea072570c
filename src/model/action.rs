use super::board::BoardColumn;
use super::container::NewContainer;
use super::task::{NewTask, TaskPatch};

/// The closed set of board mutations. Every action is applied by
/// [`crate::ops::board_ops::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum BoardAction {
    /// Replace the whole board from a full fetch
    SetInitialData(Vec<BoardColumn>),
    AddContainer(NewContainer),
    AddTask {
        container_id: String,
        task: NewTask,
    },
    UpdateTask {
        container_id: String,
        task_id: String,
        patch: TaskPatch,
    },
    DeleteTask {
        container_id: String,
        task_id: String,
    },
    /// Removes the container and every task in it
    DeleteContainer { container_id: String },
    /// Retitles the container and cascades the title onto task status
    RenameContainer { container_id: String, title: String },
    /// Splice semantics: `from_index` is a position before removal,
    /// `to_index` the insertion point in the shortened list.
    MoveWithinContainer {
        container_id: String,
        from_index: usize,
        to_index: usize,
    },
    MoveBetweenContainers {
        from_container_id: String,
        to_container_id: String,
        task_id: String,
        /// Defaults to appending
        to_index: Option<usize>,
    },
}

impl BoardAction {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            BoardAction::SetInitialData(_) => "set_initial_data",
            BoardAction::AddContainer(_) => "add_container",
            BoardAction::AddTask { .. } => "add_task",
            BoardAction::UpdateTask { .. } => "update_task",
            BoardAction::DeleteTask { .. } => "delete_task",
            BoardAction::DeleteContainer { .. } => "delete_container",
            BoardAction::RenameContainer { .. } => "rename_container",
            BoardAction::MoveWithinContainer { .. } => "move_within_container",
            BoardAction::MoveBetweenContainers { .. } => "move_between_containers",
        }
    }
}

/// A resolved drag gesture, ready to be applied to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveIntent {
    /// Reorder inside one container
    Reorder {
        task_id: String,
        container_id: String,
        from_index: usize,
        to_index: usize,
    },
    /// Re-parent into another container
    Transfer {
        task_id: String,
        from_container_id: String,
        to_container_id: String,
        to_index: Option<usize>,
    },
}

impl MoveIntent {
    pub fn task_id(&self) -> &str {
        match self {
            MoveIntent::Reorder { task_id, .. } | MoveIntent::Transfer { task_id, .. } => task_id,
        }
    }
}

impl From<MoveIntent> for BoardAction {
    fn from(intent: MoveIntent) -> Self {
        match intent {
            MoveIntent::Reorder {
                container_id,
                from_index,
                to_index,
                ..
            } => BoardAction::MoveWithinContainer {
                container_id,
                from_index,
                to_index,
            },
            MoveIntent::Transfer {
                task_id,
                from_container_id,
                to_container_id,
                to_index,
            } => BoardAction::MoveBetweenContainers {
                from_container_id,
                to_container_id,
                task_id,
                to_index,
            },
        }
    }
}

/// Outcome of applying one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Referential miss or no-op; the board is untouched
    Unchanged,
    Changed,
    /// A task changed position; the sync marker must be set
    Moved { task_id: String },
}

impl Applied {
    pub fn changed(&self) -> bool {
        !matches!(self, Applied::Unchanged)
    }
}

/// The "last moved task" marker that triggers a backend sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSync {
    pub task_id: String,
    /// Store-wide counter, bumped on every move
    pub seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_converts_to_move_action() {
        let intent = MoveIntent::Transfer {
            task_id: "a".into(),
            from_container_id: "todo".into(),
            to_container_id: "done".into(),
            to_index: Some(2),
        };
        assert_eq!(intent.task_id(), "a");
        assert_eq!(
            BoardAction::from(intent),
            BoardAction::MoveBetweenContainers {
                from_container_id: "todo".into(),
                to_container_id: "done".into(),
                task_id: "a".into(),
                to_index: Some(2),
            }
        );

        let reorder = MoveIntent::Reorder {
            task_id: "b".into(),
            container_id: "todo".into(),
            from_index: 0,
            to_index: 1,
        };
        assert_eq!(reorder.task_id(), "b");
    }
}
