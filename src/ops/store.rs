use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::model::{Applied, Board, BoardAction, BoardColumn, MoveIntent, PendingSync};
use crate::ops::board_ops;

/// Millisecond wall clock used to seed sort indices of empty containers
pub type Clock = fn() -> i64;

pub fn system_clock() -> i64 {
    Utc::now().timestamp_millis()
}

/// The authoritative in-memory board plus the "last moved task" marker.
///
/// Every mutation goes through [`BoardStore::dispatch`], which applies the
/// action synchronously and, for moves, sets the marker the sync queue
/// watches.
#[derive(Debug, Clone)]
pub struct BoardStore {
    board: Board,
    pending: Option<PendingSync>,
    seq: u64,
    clock: Clock,
}

impl Default for BoardStore {
    fn default() -> Self {
        BoardStore::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        BoardStore::with_clock(system_clock)
    }

    pub fn with_clock(clock: Clock) -> Self {
        BoardStore {
            board: Board::new(),
            pending: None,
            seq: 0,
            clock,
        }
    }

    /// Build a store seeded from a full board fetch
    pub fn from_columns(columns: Vec<BoardColumn>) -> Self {
        let mut store = BoardStore::new();
        store.dispatch(BoardAction::SetInitialData(columns));
        store
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The marker set by the most recent move, until a sync clears it
    pub fn pending_sync(&self) -> Option<&PendingSync> {
        self.pending.as_ref()
    }

    /// Sequence number of the most recent move
    pub fn last_seq(&self) -> u64 {
        self.seq
    }

    /// Apply an action. Moves set the sync marker; a full reload drops it.
    pub fn dispatch(&mut self, action: BoardAction) -> Applied {
        let name = action.name();
        let reload = matches!(action, BoardAction::SetInitialData(_));
        let applied = board_ops::apply(&mut self.board, action, (self.clock)());

        if let Applied::Moved { task_id } = &applied {
            self.seq += 1;
            self.pending = Some(PendingSync {
                task_id: task_id.clone(),
                seq: self.seq,
            });
        }
        if reload {
            self.pending = None;
        }

        debug!(action = name, ?applied, "dispatch");
        applied
    }

    /// Apply a resolved drag gesture
    pub fn apply_intent(&mut self, intent: MoveIntent) -> Applied {
        self.dispatch(intent.into())
    }

    /// Clear the marker if it is still the one with `seq`. A newer marker
    /// belongs to a later move and is left alone. Returns whether it was
    /// cleared.
    pub fn clear_pending(&mut self, seq: u64) -> bool {
        match &self.pending {
            Some(p) if p.seq == seq => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

/// Store handle shared between the gesture handler and the sync queue
pub type SharedStore = Arc<Mutex<BoardStore>>;

pub fn shared(store: BoardStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Lock the shared store. Store mutations are total and cannot leave a
/// half-applied board, so a poisoned lock is still safe to use.
pub fn lock(store: &SharedStore) -> MutexGuard<'_, BoardStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
