use std::sync::Arc;

use tracing::debug;

use super::queue::SyncQueue;
use crate::api::BoardApi;
use crate::model::config::SyncConfig;
use crate::model::{Applied, BoardAction};
use crate::ops::drag::{DropTarget, MoveResolver};
use crate::ops::store::{SharedStore, lock};

/// One board being edited: gestures are resolved against the store,
/// applied, and handed to the sync queue.
pub struct BoardSession {
    store: SharedStore,
    resolver: MoveResolver,
    queue: SyncQueue,
}

impl BoardSession {
    /// Must be created inside a tokio runtime
    pub fn new(store: SharedStore, api: Arc<dyn BoardApi>, config: SyncConfig) -> Self {
        let queue = SyncQueue::new(store.clone(), api, config);
        BoardSession {
            store,
            resolver: MoveResolver::new(),
            queue,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn queue(&self) -> &SyncQueue {
        &self.queue
    }

    pub fn resolver(&self) -> &MoveResolver {
        &self.resolver
    }

    pub fn drag_start(&mut self, active_id: &str) -> bool {
        let store = lock(&self.store);
        self.resolver.drag_start(store.board(), active_id)
    }

    pub fn drag_over(&mut self, over_id: Option<&str>) -> Option<DropTarget> {
        let store = lock(&self.store);
        self.resolver.drag_over(store.board(), over_id).cloned()
    }

    /// Resolve the drop, apply it, and schedule a sync if anything moved
    pub fn drag_end(&mut self, over_id: Option<&str>) -> Applied {
        let applied = {
            let mut store = lock(&self.store);
            let Some(intent) = self.resolver.drag_end(store.board(), over_id) else {
                return Applied::Unchanged;
            };
            let task_id = intent.task_id().to_string();
            let applied = store.apply_intent(intent);
            debug!(%task_id, ?applied, "drop applied");
            applied
        };
        self.queue.observe();
        applied
    }

    pub fn drag_cancel(&mut self) {
        debug!("drag cancelled");
        self.resolver.drag_cancel();
    }

    /// Apply a non-gesture action
    pub fn dispatch(&mut self, action: BoardAction) -> Applied {
        let applied = lock(&self.store).dispatch(action);
        self.queue.observe();
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::bulk_sort_payload;
    use crate::ops::store::{BoardStore, shared};
    use crate::sync::testing::{FakeApi, columns};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn session() -> (BoardSession, Arc<FakeApi>) {
        let api = Arc::new(FakeApi::default());
        let store = shared(BoardStore::from_columns(columns()));
        (BoardSession::new(store, api.clone(), SyncConfig::default()), api)
    }

    fn order(session: &BoardSession, container_id: &str) -> Vec<String> {
        lock(session.store()).board().containers[container_id].task_ids.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_gesture_moves_and_syncs() {
        let (mut session, api) = session();
        assert!(session.drag_start("a"));
        assert!(session.drag_over(Some("d")).is_some());
        let applied = session.drag_end(Some("d"));
        assert_eq!(applied, Applied::Moved { task_id: "a".into() });
        assert_eq!(order(&session, "doing"), vec!["a", "d"]);
        assert_eq!(order(&session, "todo"), vec!["b", "c"]);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let calls = api.bulk_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], bulk_sort_payload(lock(session.store()).board()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_gestures_send_one_sync() {
        let (mut session, api) = session();
        session.drag_start("a");
        session.drag_end(Some("c"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.drag_start("b");
        session.drag_end(Some("done"));
        session.queue().flush().await;

        assert_eq!(api.bulk_calls().len(), 1);
        assert_eq!(order(&session, "todo"), vec!["c", "a"]);
        assert_eq!(order(&session, "done"), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_gesture_sends_nothing() {
        let (mut session, api) = session();
        session.drag_start("a");
        assert_eq!(session.drag_end(Some("a")), Applied::Unchanged);
        session.drag_start("a");
        assert_eq!(session.drag_end(None), Applied::Unchanged);
        session.drag_start("a");
        session.drag_cancel();
        assert!(!session.resolver().is_dragging());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.bulk_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_move_dispatch_does_not_sync() {
        let (mut session, api) = session();
        session.dispatch(BoardAction::RenameContainer {
            container_id: "todo".into(),
            title: "Backlog".into(),
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.bulk_calls().is_empty());
        assert_eq!(lock(session.store()).board().tasks["a"].status, "Backlog");
    }
}
