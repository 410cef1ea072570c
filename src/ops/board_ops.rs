use indexmap::IndexMap;
use tracing::debug;

use crate::model::{
    Applied, Board, BoardAction, BoardColumn, Container, NewContainer, NewTask, TaskPatch,
};
use crate::ops::sort_index::{allocate_sort_index, initial_sort_index, renormalize};

/// Apply one action to the board.
///
/// Total by construction: referential misses (unknown container or task,
/// out-of-range index) leave the board untouched and return
/// [`Applied::Unchanged`]. All existence checks run before the first
/// write, so a rejected action never leaves partial state behind.
pub fn apply(board: &mut Board, action: BoardAction, now_ms: i64) -> Applied {
    match action {
        BoardAction::SetInitialData(columns) => {
            set_initial_data(board, columns);
            Applied::Changed
        }
        BoardAction::AddContainer(container) => add_container(board, container),
        BoardAction::AddTask { container_id, task } => add_task(board, &container_id, task, now_ms),
        BoardAction::UpdateTask {
            container_id,
            task_id,
            patch,
        } => update_task(board, &container_id, &task_id, &patch),
        BoardAction::DeleteTask {
            container_id,
            task_id,
        } => delete_task(board, &container_id, &task_id),
        BoardAction::DeleteContainer { container_id } => delete_container(board, &container_id),
        BoardAction::RenameContainer {
            container_id,
            title,
        } => rename_container(board, &container_id, &title),
        BoardAction::MoveWithinContainer {
            container_id,
            from_index,
            to_index,
        } => move_task_within_container(board, &container_id, from_index, to_index),
        BoardAction::MoveBetweenContainers {
            from_container_id,
            to_container_id,
            task_id,
            to_index,
        } => move_task_between_containers(
            board,
            &from_container_id,
            &to_container_id,
            &task_id,
            to_index,
        ),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Replace the board wholesale. Tasks without a sort index get
/// `position * 1000`. A repeated container id keeps its first position
/// with the later record; a repeated task id keeps its first occurrence.
pub fn set_initial_data(board: &mut Board, columns: Vec<BoardColumn>) {
    let mut by_id: IndexMap<String, BoardColumn> = IndexMap::with_capacity(columns.len());
    for column in columns {
        by_id.insert(column.id.clone(), column);
    }

    let mut next = Board::new();
    for (container_id, column) in by_id {
        let mut container = Container {
            id: container_id.clone(),
            title: column.title,
            color: column.color,
            task_ids: Vec::with_capacity(column.tasks.len()),
        };
        for record in column.tasks {
            if next.tasks.contains_key(&record.id) {
                debug!(task_id = %record.id, %container_id, "set_initial_data: duplicate task id skipped");
                continue;
            }
            let position = container.task_ids.len();
            let task = record.into_task(&container.id, &container.title, initial_sort_index(position));
            container.task_ids.push(task.id.clone());
            next.tasks.insert(task.id.clone(), task);
        }
        next.containers.insert(container_id, container);
    }

    debug!(
        containers = next.containers.len(),
        tasks = next.tasks.len(),
        "set_initial_data: board replaced"
    );
    *board = next;
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Append a container. An existing id is overwritten in place: title and
/// color take the new values, tasks stay, and a title change cascades
/// onto task status.
pub fn add_container(board: &mut Board, new: NewContainer) -> Applied {
    if let Some(existing) = board.containers.get_mut(&new.id) {
        debug!(container_id = %new.id, "add_container: id exists, overwriting");
        let color_changed = existing.color != new.color;
        existing.color = new.color;
        let renamed = rename_container(board, &new.id, &new.title);
        return if color_changed || renamed.changed() {
            Applied::Changed
        } else {
            Applied::Unchanged
        };
    }

    board.containers.insert(
        new.id.clone(),
        Container {
            id: new.id,
            title: new.title,
            color: new.color,
            task_ids: Vec::new(),
        },
    );
    Applied::Changed
}

/// Remove a container and every task it holds
pub fn delete_container(board: &mut Board, container_id: &str) -> Applied {
    let Some(container) = board.containers.shift_remove(container_id) else {
        debug!(%container_id, "delete_container: container not found");
        return Applied::Unchanged;
    };
    for id in &container.task_ids {
        board.tasks.remove(id);
    }
    debug!(%container_id, removed_tasks = container.task_ids.len(), "delete_container: removed");
    Applied::Changed
}

/// Retitle a container. Task status mirrors the container title, so the
/// new title is written onto every task in it.
pub fn rename_container(board: &mut Board, container_id: &str, title: &str) -> Applied {
    let Some(container) = board.containers.get_mut(container_id) else {
        debug!(%container_id, "rename_container: container not found");
        return Applied::Unchanged;
    };

    let mut changed = container.title != title;
    container.title = title.to_string();
    for id in &container.task_ids {
        if let Some(task) = board.tasks.get_mut(id)
            && task.status != title
        {
            task.status = title.to_string();
            changed = true;
        }
    }

    if changed {
        Applied::Changed
    } else {
        Applied::Unchanged
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Append a task to a container, allocating a sort index when the record
/// carries none. Unknown containers and ids already on the board are
/// ignored.
pub fn add_task(board: &mut Board, container_id: &str, task: NewTask, now_ms: i64) -> Applied {
    let Some(container) = board.containers.get_mut(container_id) else {
        debug!(%container_id, task_id = %task.id, "add_task: container not found");
        return Applied::Unchanged;
    };
    if board.tasks.contains_key(&task.id) {
        debug!(task_id = %task.id, "add_task: task id already on board");
        return Applied::Unchanged;
    }

    let sort_index = match task.sort_index {
        Some(key) => key,
        None => allocate_sort_index(
            container
                .task_ids
                .iter()
                .filter_map(|id| board.tasks.get(id))
                .map(|t| t.sort_index),
            now_ms,
        ),
    };
    let task = task.into_task(&container.id, &container.title, sort_index);
    container.task_ids.push(task.id.clone());
    board.tasks.insert(task.id.clone(), task);
    Applied::Changed
}

/// Shallow-merge a patch into a task of the given container
pub fn update_task(board: &mut Board, container_id: &str, task_id: &str, patch: &TaskPatch) -> Applied {
    let Some(task) = board.tasks.get_mut(task_id) else {
        debug!(%task_id, "update_task: task not found");
        return Applied::Unchanged;
    };
    if task.container_id != container_id {
        debug!(%task_id, %container_id, "update_task: task is not in container");
        return Applied::Unchanged;
    }
    if patch.apply_to(task) {
        Applied::Changed
    } else {
        Applied::Unchanged
    }
}

/// Remove a task and renumber the rest of its container
pub fn delete_task(board: &mut Board, container_id: &str, task_id: &str) -> Applied {
    let Some(container) = board.containers.get_mut(container_id) else {
        debug!(%container_id, "delete_task: container not found");
        return Applied::Unchanged;
    };
    let Some(idx) = container.position(task_id) else {
        debug!(%task_id, %container_id, "delete_task: task not in container");
        return Applied::Unchanged;
    };

    container.task_ids.remove(idx);
    board.tasks.remove(task_id);
    renormalize(container, &mut board.tasks);
    Applied::Changed
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// Move the task at `from_index` to `to_index` inside one container.
/// `to_index` past the end is clamped to the last position.
pub fn move_task_within_container(
    board: &mut Board,
    container_id: &str,
    from_index: usize,
    to_index: usize,
) -> Applied {
    let Some(container) = board.containers.get_mut(container_id) else {
        debug!(%container_id, "move_task_within_container: container not found");
        return Applied::Unchanged;
    };
    if from_index >= container.len() {
        debug!(%container_id, from_index, "move_task_within_container: index out of range");
        return Applied::Unchanged;
    }
    let to_index = to_index.min(container.len() - 1);
    if from_index == to_index {
        return Applied::Unchanged;
    }

    let task_id = container.task_ids.remove(from_index);
    container.task_ids.insert(to_index, task_id.clone());
    renormalize(container, &mut board.tasks);

    debug!(%task_id, %container_id, from_index, to_index, "move_task_within_container: moved");
    Applied::Moved { task_id }
}

/// Re-parent a task into another container at `to_index` (append when
/// absent or past the end). Both containers are renumbered. A move onto
/// the source container itself is a reorder.
pub fn move_task_between_containers(
    board: &mut Board,
    from_container_id: &str,
    to_container_id: &str,
    task_id: &str,
    to_index: Option<usize>,
) -> Applied {
    let (Some(from_pos), Some(to_pos)) = (
        board.containers.get_index_of(from_container_id),
        board.containers.get_index_of(to_container_id),
    ) else {
        debug!(%from_container_id, %to_container_id, "move_task_between_containers: container not found");
        return Applied::Unchanged;
    };
    let Some(idx) = board.containers[from_pos].position(task_id) else {
        debug!(%task_id, %from_container_id, "move_task_between_containers: task not in source");
        return Applied::Unchanged;
    };

    if from_pos == to_pos {
        let last = board.containers[from_pos].len() - 1;
        return move_task_within_container(board, from_container_id, idx, to_index.unwrap_or(last));
    }

    let moved = board.containers[from_pos].task_ids.remove(idx);
    let dest = &mut board.containers[to_pos];
    let at = to_index.map_or(dest.len(), |i| i.min(dest.len()));
    dest.task_ids.insert(at, moved.clone());
    if let Some(task) = board.tasks.get_mut(&moved) {
        task.container_id = dest.id.clone();
        task.status = dest.title.clone();
    }

    renormalize(&board.containers[from_pos], &mut board.tasks);
    renormalize(&board.containers[to_pos], &mut board.tasks);

    debug!(task_id = %moved, %from_container_id, %to_container_id, at, "move_task_between_containers: moved");
    Applied::Moved { task_id: moved }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
