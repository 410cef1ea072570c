use serde::Serialize;

use crate::model::{Board, Container, Priority, Task};
use crate::sync::SyncOutcome;
use crate::util::unicode::{display_width, pad_to_width, single_line, truncate_to_width};

/// Titles longer than this are cut with `…` in listings
const TITLE_WIDTH: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: Priority,
    pub sort_index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
}

#[derive(Serialize)]
pub struct SectionJson {
    pub id: String,
    pub title: String,
    pub color: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub sections: Vec<SectionJson>,
}

#[derive(Serialize)]
pub struct MoveJson {
    pub task_id: String,
    pub from: String,
    pub to: String,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        status: task.status.clone(),
        priority: task.priority,
        sort_index: task.sort_index,
        description: task.description.clone(),
        due_date: task.due_date.clone(),
        assignees: task
            .assignees
            .iter()
            .map(|a| a.display_name().to_string())
            .collect(),
    }
}

pub fn section_to_json(board: &Board, container: &Container) -> SectionJson {
    SectionJson {
        id: container.id.clone(),
        title: container.title.clone(),
        color: container.color.clone(),
        tasks: board.tasks_in(&container.id).into_iter().map(task_to_json).collect(),
    }
}

pub fn board_to_json(board: &Board, only: Option<&str>) -> BoardJson {
    BoardJson {
        sections: board
            .containers
            .values()
            .filter(|c| only.is_none_or(|id| c.id == id))
            .map(|c| section_to_json(board, c))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "[H] ",
        Priority::Normal => "",
        Priority::Low => "[L] ",
    }
}

/// Format a single task as a one-line summary: sort index, id, title
pub fn format_task_line(task: &Task, id_width: usize) -> String {
    format!(
        "  {:>6}  {}  {}{}",
        task.sort_index,
        pad_to_width(&task.id, id_width),
        priority_marker(task.priority),
        truncate_to_width(&single_line(&task.title), TITLE_WIDTH)
    )
}

pub fn format_section_header(container: &Container) -> String {
    format!("== {} ({}) [{}] ==", container.title, container.id, container.len())
}

/// Format the board, one block per section in display order
pub fn format_board(board: &Board, only: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    for container in board.containers.values() {
        if only.is_some_and(|id| container.id != id) {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format_section_header(container));

        let tasks = board.tasks_in(&container.id);
        if tasks.is_empty() {
            lines.push("  (empty)".to_string());
            continue;
        }
        let id_width = tasks.iter().map(|t| display_width(&t.id)).max().unwrap_or(0);
        for task in tasks {
            lines.push(format_task_line(task, id_width));
        }
    }
    lines
}

pub fn format_sync_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Synced { modified_count, .. } => {
            format!("synced ({} modified)", modified_count)
        }
        SyncOutcome::Superseded { .. } => "sync superseded by a newer move".to_string(),
        SyncOutcome::Failed { error, .. } => {
            format!("sync failed: {} (run `bsync sync` to retry)", error)
        }
    }
}

/// Parse a priority string, listing the accepted spellings on error
pub fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse()
}
