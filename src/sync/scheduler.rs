use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    pending: Option<JoinHandle<()>>,
    running: usize,
}

/// Single-slot debounce timer.
///
/// Arming replaces whatever job is waiting. A job whose delay has elapsed
/// is detached from the slot before it runs, so re-arming or cancelling
/// never interrupts it. Must be used inside a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct SyncScheduler {
    slot: Arc<Mutex<Slot>>,
    idle: Arc<Notify>,
}

impl SyncScheduler {
    pub fn new() -> Self {
        SyncScheduler::default()
    }

    /// Run `job` after `delay` unless the slot is re-armed or cancelled first
    pub fn arm<F>(&self, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        let generation = slot.generation;
        if let Some(handle) = slot.pending.take() {
            handle.abort();
        }

        let shared = Arc::clone(&self.slot);
        let idle = Arc::clone(&self.idle);
        slot.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.pending = None;
                slot.running += 1;
            }
            let _running = Running { slot: shared, idle };
            job.await;
        }));
    }

    /// Drop the waiting job, if any. Returns whether one was dropped.
    pub fn cancel(&self) -> bool {
        let mut slot = lock(&self.slot);
        let Some(handle) = slot.pending.take() else {
            return false;
        };
        slot.generation += 1;
        handle.abort();
        drop(slot);
        self.idle.notify_waiters();
        true
    }

    /// Whether a job is waiting for its delay to elapse
    pub fn is_armed(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }

    /// Whether nothing is waiting and nothing is running
    pub fn is_idle(&self) -> bool {
        let slot = lock(&self.slot);
        slot.pending.is_none() && slot.running == 0
    }

    /// Wait until every armed or running job has finished
    pub async fn flush(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

/// Marks a fired job as running until dropped, including on panic
struct Running {
    slot: Arc<Mutex<Slot>>,
    idle: Arc<Notify>,
}

impl Drop for Running {
    fn drop(&mut self) {
        lock(&self.slot).running -= 1;
        self.idle.notify_waiters();
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn bump(count: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let count = Arc::clone(count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let scheduler = SyncScheduler::new();
        let count = counter();
        scheduler.arm(Duration::from_millis(300), bump(&count));
        assert!(scheduler.is_armed());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending_job() {
        let scheduler = SyncScheduler::new();
        let first = counter();
        let second = counter();
        scheduler.arm(Duration::from_millis(300), bump(&first));
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.arm(Duration::from_millis(300), bump(&second));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_job() {
        let scheduler = SyncScheduler::new();
        let count = counter();
        scheduler.arm(Duration::from_millis(300), bump(&count));
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_job_survives_rearm() {
        let scheduler = SyncScheduler::new();
        let count = counter();
        let slow = {
            let count = Arc::clone(&count);
            async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                count.fetch_add(1, Ordering::SeqCst);
            }
        };
        scheduler.arm(Duration::from_millis(300), slow);
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert!(!scheduler.cancel());
        scheduler.arm(Duration::from_millis(300), bump(&count));
        scheduler.flush().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_when_idle_returns_immediately() {
        let scheduler = SyncScheduler::new();
        scheduler.flush().await;
        assert!(scheduler.is_idle());
    }
}
