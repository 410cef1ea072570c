pub mod board_ops;
pub mod check;
pub mod drag;
pub mod sort_index;
pub mod store;

pub use board_ops::apply;
pub use check::{check_board, CheckResult};
pub use drag::{DragState, DropTarget, MoveResolver};
pub use store::{BoardStore, SharedStore};
