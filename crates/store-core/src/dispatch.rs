//! Store dispatch loop.
//!
//! Single consumer of the event channel: each event is applied to the store
//! synchronously, then the requested effects run — snapshot writes through
//! the [`SnapshotStore`] (best-effort, failures logged and swallowed) and
//! notice broadcast. Suspension points exist only between events, never
//! inside a transition.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

use crate::{
    normalization::{normalize_chats, normalize_messages},
    persist::{SnapshotKind, SnapshotStore},
    store::{ChatStore, StoreEffect},
    types::{StoreEvent, StoreNotice},
};

/// Owns the store and drives it from the event channel.
///
/// Holds only the notice sender, so the event channel closes (and [`run`]
/// returns) once every external event producer is gone.
///
/// [`run`]: Dispatcher::run
pub struct Dispatcher<S: SnapshotStore> {
    store: ChatStore,
    snapshots: S,
    notices: broadcast::Sender<StoreNotice>,
}

impl<S: SnapshotStore> Dispatcher<S> {
    pub fn new(store: ChatStore, snapshots: S, notices: broadcast::Sender<StoreNotice>) -> Self {
        Self {
            store,
            snapshots,
            notices,
        }
    }

    /// Read access to the current store state.
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Apply one event and run its effects.
    pub fn dispatch(&mut self, event: StoreEvent) {
        trace!(?event, "dispatching store event");
        let effects = self.store.apply(event);
        for effect in effects {
            match effect {
                StoreEffect::Persist(kind) => self.persist(kind),
                StoreEffect::Notify(notice) => {
                    // Best-effort fan-out; no subscribers is fine.
                    let _ = self.notices.send(notice);
                }
            }
        }
    }

    /// Consume the event channel until every sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<StoreEvent>) -> ChatStore {
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
        debug!("event channel closed; dispatch loop finished");
        self.store
    }

    /// Best-effort snapshot write; a failed persist never rolls back the
    /// in-memory mutation.
    fn persist(&mut self, kind: SnapshotKind) {
        let result = match kind {
            SnapshotKind::ChatList => self
                .snapshots
                .save_chat_list(&normalize_chats(self.store.chats())),
            SnapshotKind::Messages => self
                .snapshots
                .save_messages(&normalize_messages(self.store.messages())),
            SnapshotKind::Unread => self.snapshots.save_unread(self.store.unread().entries()),
            SnapshotKind::ActiveChat => self.snapshots.save_active_chat(self.store.active_chat()),
        };

        if let Err(err) = result {
            warn!(?kind, %err, "snapshot persist failed; continuing");
        }
    }
}
