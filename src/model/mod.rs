pub mod action;
pub mod board;
pub mod config;
pub mod container;
pub mod task;

pub use action::*;
pub use board::*;
pub use config::*;
pub use container::*;
pub use task::*;
