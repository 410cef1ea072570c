//! Sort-index allocation.
//!
//! Two strategies coexist: new tasks get a gapped key (`max + 1000`) so
//! single inserts never rewrite siblings, while structural changes
//! (delete, reorder, cross-container move) renumber the whole container to
//! `0..n` so no colliding keys ever reach the backend.

use std::collections::HashMap;

use crate::model::{Container, Task};

/// Gap between keys assigned at initial load and on append
pub const SORT_INDEX_STEP: i64 = 1000;

/// Key for a task at `position` in a freshly loaded container
pub fn initial_sort_index(position: usize) -> i64 {
    position as i64 * SORT_INDEX_STEP
}

/// Allocate a key for a task appended to a container whose current keys
/// are `existing`. An empty container is seeded with `now_ms` so new keys
/// cannot collide with legacy rows.
pub fn allocate_sort_index(existing: impl IntoIterator<Item = i64>, now_ms: i64) -> i64 {
    match existing.into_iter().max() {
        Some(max) => max.saturating_add(SORT_INDEX_STEP),
        None => now_ms,
    }
}

/// Reassign `sort_index = position` for every task of the container
pub fn renormalize(container: &Container, tasks: &mut HashMap<String, Task>) {
    for (position, id) in container.task_ids.iter().enumerate() {
        if let Some(task) = tasks.get_mut(id) {
            task.sort_index = position as i64;
        }
    }
}

/// Whether sort indices strictly increase along array order
pub fn is_monotonic(container: &Container, tasks: &HashMap<String, Task>) -> bool {
    let keys: Vec<i64> = container
        .task_ids
        .iter()
        .filter_map(|id| tasks.get(id).map(|t| t.sort_index))
        .collect();
    keys.windows(2).all(|w| w[0] < w[1])
}
