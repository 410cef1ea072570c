pub mod queue;
pub mod scheduler;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use queue::{SyncError, SyncOutcome, SyncQueue};
pub use scheduler::SyncScheduler;
pub use session::BoardSession;
