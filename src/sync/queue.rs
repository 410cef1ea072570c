use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::scheduler::SyncScheduler;
use crate::api::{
    ApiError, BoardApi, BulkSortUpdateResponse, ContainerReorderResponse, bulk_sort_payload,
    container_reorder_payload,
};
use crate::model::config::SyncConfig;
use crate::ops::store::{SharedStore, lock};

/// Error type for the explicit sync paths
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("container not found: {0}")]
    UnknownContainer(String),
}

/// How the last debounced sync ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced { seq: u64, modified_count: u64 },
    /// A newer move took over before a retry was sent
    Superseded { seq: u64 },
    /// Local order was kept; the server may have drifted
    Failed { seq: u64, error: String },
}

impl SyncOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            SyncOutcome::Synced { seq, .. }
            | SyncOutcome::Superseded { seq }
            | SyncOutcome::Failed { seq, .. } => *seq,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }
}

/// Pushes board ordering to the backend after moves settle.
///
/// Call [`SyncQueue::observe`] after every dispatch. When the store's
/// "last moved" marker changes, the debounce timer is (re)armed; when it
/// fires, the whole board's ordering is sent in one bulk update and the
/// marker is cleared, whatever the outcome.
#[derive(Clone)]
pub struct SyncQueue {
    store: SharedStore,
    api: Arc<dyn BoardApi>,
    config: SyncConfig,
    scheduler: SyncScheduler,
    last_seen: Arc<Mutex<Option<u64>>>,
    last_outcome: Arc<Mutex<Option<SyncOutcome>>>,
}

impl SyncQueue {
    pub fn new(store: SharedStore, api: Arc<dyn BoardApi>, config: SyncConfig) -> Self {
        SyncQueue {
            store,
            api,
            config,
            scheduler: SyncScheduler::new(),
            last_seen: Arc::new(Mutex::new(None)),
            last_outcome: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn last_outcome(&self) -> Option<SyncOutcome> {
        self.last_outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// React to the store's marker. A new marker (re)arms the debounce
    /// timer; a marker dropped by a reload cancels a waiting sync. Returns
    /// whether the timer was armed.
    pub fn observe(&self) -> bool {
        let marker = lock(&self.store).pending_sync().map(|p| p.seq);
        {
            let mut last_seen = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
            if *last_seen == marker {
                return false;
            }
            *last_seen = marker;
        }

        let Some(seq) = marker else {
            if self.scheduler.cancel() {
                debug!("sync: marker cleared, pending sync dropped");
            }
            return false;
        };
        debug!(seq, delay_ms = self.config.debounce_ms, "sync: armed");
        let queue = self.clone();
        self.scheduler
            .arm(self.config.debounce(), async move { queue.fire(seq).await });
        true
    }

    /// Wait for any armed or in-flight debounced sync to finish
    pub async fn flush(&self) {
        self.scheduler.flush().await;
    }

    /// Send one container's ordering now, bypassing the debounce
    pub async fn sync_container(&self, container_id: &str) -> Result<ContainerReorderResponse, SyncError> {
        let payload = {
            let store = lock(&self.store);
            container_reorder_payload(store.board(), container_id)
        };
        let Some(payload) = payload else {
            return Err(SyncError::UnknownContainer(container_id.to_string()));
        };
        let response = self.api.reorder_container(container_id, &payload).await?;
        info!(
            container_id,
            modified = response.modified_count,
            "sync: container reordered"
        );
        Ok(response)
    }

    /// Send the whole board's ordering now, bypassing the debounce
    pub async fn sync_all(&self) -> Result<BulkSortUpdateResponse, SyncError> {
        let payload = bulk_sort_payload(lock(&self.store).board());
        let response = self.api.bulk_sort_update(&payload).await?;
        info!(
            tasks = payload.updates.len(),
            modified = response.modified_count,
            "sync: full board synced"
        );
        Ok(response)
    }

    async fn fire(&self, seq: u64) {
        let outcome = self.push(seq).await;
        match &outcome {
            SyncOutcome::Synced { modified_count, .. } => {
                info!(seq, modified = modified_count, "sync: ordering synced")
            }
            SyncOutcome::Superseded { .. } => debug!(seq, "sync: superseded by a newer move"),
            SyncOutcome::Failed { error, .. } => {
                warn!(seq, %error, "sync: failed, keeping local order")
            }
        }
        lock(&self.store).clear_pending(seq);

        let mut last = self.last_outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref().is_none_or(|o| o.seq() <= seq) {
            *last = Some(outcome);
        }
    }

    async fn push(&self, seq: u64) -> SyncOutcome {
        let retries = self.config.retries();
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let backoff = self.config.backoff(attempt);
                warn!(
                    seq,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "sync: retrying after transient error"
                );
                tokio::time::sleep(backoff).await;
                if lock(&self.store).last_seq() > seq {
                    return SyncOutcome::Superseded { seq };
                }
            }

            let payload = bulk_sort_payload(lock(&self.store).board());
            match self.api.bulk_sort_update(&payload).await {
                Ok(response) => {
                    return SyncOutcome::Synced {
                        seq,
                        modified_count: response.modified_count,
                    };
                }
                Err(e) if e.is_retryable() && attempt < retries => {
                    debug!(seq, attempt, error = %e, "sync: retryable error");
                    attempt += 1;
                }
                Err(e) => {
                    return SyncOutcome::Failed {
                        seq,
                        error: e.to_string(),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::FailurePolicy;
    use crate::model::{BoardAction, BoardColumn};
    use crate::ops::store::{BoardStore, shared};
    use crate::sync::testing::{FakeApi, columns};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn setup(config: SyncConfig) -> (SyncQueue, Arc<FakeApi>) {
        let store = shared(BoardStore::from_columns(columns()));
        let api = Arc::new(FakeApi::default());
        let queue = SyncQueue::new(store, api.clone(), config);
        (queue, api)
    }

    fn move_first(queue: &SyncQueue) {
        lock(queue.store()).dispatch(BoardAction::MoveWithinContainer {
            container_id: "todo".into(),
            from_index: 0,
            to_index: 2,
        });
        queue.observe();
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_one_call_with_final_state() {
        let (queue, api) = setup(SyncConfig::default());

        move_first(&queue);
        sleep_ms(100).await;
        lock(queue.store()).dispatch(BoardAction::MoveBetweenContainers {
            from_container_id: "todo".into(),
            to_container_id: "doing".into(),
            task_id: "b".into(),
            to_index: None,
        });
        queue.observe();
        sleep_ms(1000).await;

        let calls = api.bulk_calls();
        assert_eq!(calls.len(), 1);
        let expected = bulk_sort_payload(lock(queue.store()).board());
        assert_eq!(calls[0], expected);
        assert!(lock(queue.store()).pending_sync().is_none());
        assert!(matches!(queue.last_outcome(), Some(SyncOutcome::Synced { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_moving_same_task_twice_rearms() {
        let (queue, api) = setup(SyncConfig::default());
        move_first(&queue);
        sleep_ms(200).await;
        lock(queue.store()).dispatch(BoardAction::MoveWithinContainer {
            container_id: "todo".into(),
            from_index: 2,
            to_index: 0,
        });
        assert!(queue.observe());

        sleep_ms(200).await;
        assert!(api.bulk_calls().is_empty());
        sleep_ms(200).await;
        assert_eq!(api.bulk_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_of_unknown_task_does_not_arm() {
        let (queue, api) = setup(SyncConfig::default());
        lock(queue.store()).dispatch(BoardAction::MoveBetweenContainers {
            from_container_id: "todo".into(),
            to_container_id: "doing".into(),
            task_id: "ghost".into(),
            to_index: None,
        });
        assert!(!queue.observe());
        assert!(!queue.scheduler().is_armed());

        sleep_ms(1000).await;
        assert!(api.bulk_calls().is_empty());
        assert!(queue.last_outcome().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_without_change_does_not_rearm() {
        let (queue, api) = setup(SyncConfig::default());
        move_first(&queue);
        sleep_ms(200).await;
        assert!(!queue.observe());
        sleep_ms(150).await;
        assert_eq!(api.bulk_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_under_drift_keeps_local_order() {
        let config = SyncConfig {
            on_failure: FailurePolicy::Drift,
            ..SyncConfig::default()
        };
        let (queue, api) = setup(config);
        api.fail_next(503);
        move_first(&queue);
        let before = lock(queue.store()).board().clone();
        queue.flush().await;

        assert_eq!(api.bulk_calls().len(), 1);
        assert_eq!(lock(queue.store()).board(), &before);
        assert!(lock(queue.store()).pending_sync().is_none());
        assert!(queue.last_outcome().is_some_and(|o| o.is_failed()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let (queue, api) = setup(SyncConfig::default());
        api.fail_next(503);
        api.fail_next(429);
        move_first(&queue);
        queue.flush().await;

        assert_eq!(api.bulk_calls().len(), 3);
        assert!(matches!(queue.last_outcome(), Some(SyncOutcome::Synced { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let (queue, api) = setup(SyncConfig::default());
        api.fail_next(400);
        move_first(&queue);
        queue.flush().await;

        assert_eq!(api.bulk_calls().len(), 1);
        assert!(queue.last_outcome().is_some_and(|o| o.is_failed()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_skipped_when_newer_move_exists() {
        let (queue, api) = setup(SyncConfig::default());
        api.fail_next(503);
        move_first(&queue);
        // first attempt fails at 300ms; its retry would go out at 800ms
        sleep_ms(400).await;
        move_first(&queue);
        queue.flush().await;

        let calls = api.bulk_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], bulk_sort_payload(lock(queue.store()).board()));
        assert!(lock(queue.store()).pending_sync().is_none());
        assert_eq!(
            queue.last_outcome(),
            Some(SyncOutcome::Synced {
                seq: 2,
                modified_count: 4
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_cancels_waiting_sync() {
        let (queue, api) = setup(SyncConfig::default());
        move_first(&queue);
        lock(queue.store()).dispatch(BoardAction::SetInitialData(columns()));
        queue.observe();
        sleep_ms(1000).await;
        assert!(api.bulk_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_container_sends_one_container() {
        let (queue, api) = setup(SyncConfig::default());
        let response = queue.sync_container("todo").await.unwrap();
        assert_eq!(response.container_id, "todo");
        let calls = api.reorder_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.task_orders.len(), 3);

        let err = queue.sync_container("nope").await.unwrap_err();
        assert!(matches!(err, SyncError::UnknownContainer(id) if id == "nope"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_all_is_immediate() {
        let (queue, api) = setup(SyncConfig::default());
        let response = queue.sync_all().await.unwrap();
        assert_eq!(response.modified_count, 4);
        assert_eq!(api.bulk_calls().len(), 1);
        assert!(queue.last_outcome().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_all_surfaces_errors() {
        let (queue, api) = setup(SyncConfig::default());
        api.fail_next(500);
        let err = queue.sync_all().await.unwrap_err();
        assert!(matches!(err, SyncError::Api(ApiError::Status { status: 500, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_board_syncs_empty_payload() {
        let store = shared(BoardStore::from_columns(vec![BoardColumn {
            id: "x".into(),
            title: "X".into(),
            color: String::new(),
            tasks: Vec::new(),
        }]));
        let api = Arc::new(FakeApi::default());
        let queue = SyncQueue::new(store, api.clone(), SyncConfig::default());
        queue.sync_all().await.unwrap();
        assert!(api.bulk_calls()[0].updates.is_empty());
    }
}
