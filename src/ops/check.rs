use std::collections::HashMap;

use serde::Serialize;

use crate::model::Board;
use crate::ops::sort_index::is_monotonic;

/// Structured result from `bsync check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A broken ordering invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The same task id is listed by more than one container (or twice)
    #[serde(rename = "duplicate_task")]
    DuplicateTask {
        task_id: String,
        container_ids: Vec<String>,
    },
    /// A container lists a task id that has no task record
    #[serde(rename = "missing_task")]
    MissingTask {
        container_id: String,
        task_id: String,
    },
    /// A task record that no container lists
    #[serde(rename = "orphan_task")]
    OrphanTask { task_id: String },
    /// A task's `containerId` disagrees with the container listing it
    #[serde(rename = "container_mismatch")]
    ContainerMismatch {
        task_id: String,
        container_id: String,
        listed_in: String,
    },
}

/// Something that will be corrected by the next structural change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Sort keys do not increase along array order
    #[serde(rename = "unordered_sort_index")]
    UnorderedSortIndex { container_id: String },
    /// A task's status differs from its container's title
    #[serde(rename = "status_mismatch")]
    StatusMismatch {
        task_id: String,
        status: String,
        container_title: String,
    },
}

/// Validate the board's ordering invariants. Read-only.
pub fn check_board(board: &Board) -> CheckResult {
    let mut result = CheckResult::default();
    let mut listed: HashMap<&str, Vec<String>> = HashMap::new();

    for container in board.containers.values() {
        for task_id in &container.task_ids {
            listed
                .entry(task_id.as_str())
                .or_default()
                .push(container.id.clone());

            let Some(task) = board.tasks.get(task_id) else {
                result.errors.push(CheckError::MissingTask {
                    container_id: container.id.clone(),
                    task_id: task_id.clone(),
                });
                continue;
            };
            if task.container_id != container.id {
                result.errors.push(CheckError::ContainerMismatch {
                    task_id: task_id.clone(),
                    container_id: task.container_id.clone(),
                    listed_in: container.id.clone(),
                });
            }
            if task.status != container.title {
                result.warnings.push(CheckWarning::StatusMismatch {
                    task_id: task_id.clone(),
                    status: task.status.clone(),
                    container_title: container.title.clone(),
                });
            }
        }

        if !is_monotonic(container, &board.tasks) {
            result.warnings.push(CheckWarning::UnorderedSortIndex {
                container_id: container.id.clone(),
            });
        }
    }

    let mut duplicates: Vec<(&str, Vec<String>)> = listed
        .iter()
        .filter(|(_, containers)| containers.len() > 1)
        .map(|(id, containers)| (*id, containers.clone()))
        .collect();
    duplicates.sort();
    for (task_id, container_ids) in duplicates {
        result.errors.push(CheckError::DuplicateTask {
            task_id: task_id.to_string(),
            container_ids,
        });
    }

    let mut orphans: Vec<&String> = board
        .tasks
        .keys()
        .filter(|id| !listed.contains_key(id.as_str()))
        .collect();
    orphans.sort();
    for task_id in orphans {
        result.errors.push(CheckError::OrphanTask {
            task_id: task_id.clone(),
        });
    }

    result.valid = result.errors.is_empty();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoardAction, BoardColumn, NewTask, Task};
    use crate::ops::board_ops::apply;

    fn board() -> Board {
        let mut board = Board::new();
        apply(
            &mut board,
            BoardAction::SetInitialData(vec![
                BoardColumn {
                    id: "x".into(),
                    title: "X".into(),
                    color: String::new(),
                    tasks: vec![NewTask::new("a", "A"), NewTask::new("b", "B")],
                },
                BoardColumn {
                    id: "y".into(),
                    title: "Y".into(),
                    color: String::new(),
                    tasks: vec![NewTask::new("c", "C")],
                },
            ]),
            0,
        );
        board
    }

    #[test]
    fn test_loaded_board_is_valid() {
        let result = check_board(&board());
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_valid_after_a_sequence_of_moves() {
        let mut board = board();
        for action in [
            BoardAction::MoveBetweenContainers {
                from_container_id: "x".into(),
                to_container_id: "y".into(),
                task_id: "a".into(),
                to_index: Some(0),
            },
            BoardAction::MoveWithinContainer {
                container_id: "y".into(),
                from_index: 0,
                to_index: 1,
            },
            BoardAction::DeleteTask {
                container_id: "x".into(),
                task_id: "b".into(),
            },
        ] {
            apply(&mut board, action, 0);
            let result = check_board(&board);
            assert!(result.valid, "{:?}", result.errors);
            assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        }
    }

    #[test]
    fn test_detects_duplicate_and_orphan() {
        let mut board = board();
        board.containers["y"].task_ids.push("a".into());
        let mut stray = Task::new("z", "Z");
        stray.container_id = "x".into();
        board.tasks.insert("z".into(), stray);

        let result = check_board(&board);
        assert!(!result.valid);
        assert!(result.errors.contains(&CheckError::DuplicateTask {
            task_id: "a".into(),
            container_ids: vec!["x".into(), "y".into()],
        }));
        assert!(result.errors.contains(&CheckError::ContainerMismatch {
            task_id: "a".into(),
            container_id: "x".into(),
            listed_in: "y".into(),
        }));
        assert!(result.errors.contains(&CheckError::OrphanTask { task_id: "z".into() }));
    }

    #[test]
    fn test_unordered_keys_are_warnings() {
        let mut board = board();
        if let Some(task) = board.tasks.get_mut("a") {
            task.sort_index = 5000;
        }
        let result = check_board(&board);
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec![CheckWarning::UnorderedSortIndex {
                container_id: "x".into()
            }]
        );
    }
}
