//! Drag gesture → move intent.
//!
//! The host's drag library reports the id under the pointer (already
//! resolved by its collision heuristic); this module only interprets ids
//! against the current board. Hover tracking is advisory and never
//! mutates the board.

use tracing::debug;

use crate::model::{Board, MoveIntent};

/// Where a dragged task would land if dropped now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Over a task: the dragged task takes that task's slot
    Task {
        task_id: String,
        container_id: String,
        index: usize,
    },
    /// Over a container's empty area: the dragged task goes to the end
    Container {
        container_id: String,
        append_index: usize,
    },
}

impl DropTarget {
    pub fn container_id(&self) -> &str {
        match self {
            DropTarget::Task { container_id, .. } | DropTarget::Container { container_id, .. } => {
                container_id
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        active_id: String,
        source_container_id: String,
        hover: Option<DropTarget>,
    },
}

/// Tracks one drag gesture at a time: `Idle → Dragging → Idle`
#[derive(Debug, Default)]
pub struct MoveResolver {
    state: DragState,
}

impl MoveResolver {
    pub fn new() -> Self {
        MoveResolver::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Begin dragging the task `active_id`. Ids that are not tasks on the
    /// board are ignored. Returns whether a drag started.
    pub fn drag_start(&mut self, board: &Board, active_id: &str) -> bool {
        let Some(task) = board.task(active_id) else {
            debug!(%active_id, "drag_start: not a task, ignored");
            return false;
        };
        self.state = DragState::Dragging {
            active_id: active_id.to_string(),
            source_container_id: task.container_id.clone(),
            hover: None,
        };
        true
    }

    /// Record the current hover target for visual feedback. `None` means
    /// the pointer is over nothing droppable.
    pub fn drag_over(&mut self, board: &Board, over_id: Option<&str>) -> Option<&DropTarget> {
        let DragState::Dragging {
            active_id, hover, ..
        } = &mut self.state
        else {
            return None;
        };
        *hover = over_id
            .filter(|id| *id != active_id.as_str())
            .and_then(|id| resolve_target(board, id));
        hover.as_ref()
    }

    /// Finish the gesture and resolve it into an intent. Always returns to
    /// `Idle`; `None` means the drop was cancelled or could not be resolved.
    pub fn drag_end(&mut self, board: &Board, over_id: Option<&str>) -> Option<MoveIntent> {
        let DragState::Dragging {
            active_id,
            source_container_id,
            ..
        } = std::mem::take(&mut self.state)
        else {
            return None;
        };
        let Some(over_id) = over_id else {
            debug!(%active_id, "drag_end: dropped outside any target");
            return None;
        };
        resolve_drop(board, &active_id, &source_container_id, over_id)
    }

    pub fn drag_cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Interpret `over_id` as a drop target on the current board
pub fn resolve_target(board: &Board, over_id: &str) -> Option<DropTarget> {
    if let Some(container) = board.container(over_id) {
        return Some(DropTarget::Container {
            container_id: container.id.clone(),
            append_index: container.len(),
        });
    }
    let container = board.find_container(over_id)?;
    let index = container.position(over_id)?;
    Some(DropTarget::Task {
        task_id: over_id.to_string(),
        container_id: container.id.clone(),
        index,
    })
}

/// Resolve a drop of `active_id` (dragged out of `source_container_id`)
/// onto `over_id`.
///
/// - dropping onto itself cancels
/// - same container: reorder to the target task's index, or to the end
///   when dropped on the container's empty area
/// - other container: insert at the target task's index, or append
/// - unknown source or destination: discarded
pub fn resolve_drop(
    board: &Board,
    active_id: &str,
    source_container_id: &str,
    over_id: &str,
) -> Option<MoveIntent> {
    if active_id == over_id {
        debug!(%active_id, "resolve_drop: dropped onto itself");
        return None;
    }
    let Some(source) = board.container(source_container_id) else {
        debug!(%source_container_id, "resolve_drop: source container missing");
        return None;
    };
    let Some(from_index) = source.position(active_id) else {
        debug!(%active_id, %source_container_id, "resolve_drop: task left its source container");
        return None;
    };
    let Some(target) = resolve_target(board, over_id) else {
        debug!(%over_id, "resolve_drop: destination not found");
        return None;
    };

    let intent = if target.container_id() == source.id {
        let to_index = match target {
            DropTarget::Task { index, .. } => index,
            DropTarget::Container { append_index, .. } => append_index.saturating_sub(1),
        };
        MoveIntent::Reorder {
            task_id: active_id.to_string(),
            container_id: source.id.clone(),
            from_index,
            to_index,
        }
    } else {
        let (to_container_id, to_index) = match target {
            DropTarget::Task {
                container_id,
                index,
                ..
            } => (container_id, Some(index)),
            DropTarget::Container { container_id, .. } => (container_id, None),
        };
        MoveIntent::Transfer {
            task_id: active_id.to_string(),
            from_container_id: source.id.clone(),
            to_container_id,
            to_index,
        }
    };
    debug!(?intent, "resolve_drop: resolved");
    Some(intent)
}
