use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::types::{StoreEvent, StoreNotice};

/// Broadcast notice stream type used by UI subscribers.
pub type NoticeStream = broadcast::Receiver<StoreNotice>;

/// Errors returned by store channel operations.
#[derive(Debug, Error)]
pub enum StoreChannelError {
    /// The event receiver side is closed.
    #[error("event channel is closed")]
    EventChannelClosed,
}

/// Event/notice channel pair connecting event producers (REST responses,
/// push callbacks, user actions) to the dispatch loop, and the dispatch loop
/// to notice subscribers.
#[derive(Clone, Debug)]
pub struct StoreChannels {
    event_tx: mpsc::Sender<StoreEvent>,
    notice_tx: broadcast::Sender<StoreNotice>,
}

impl StoreChannels {
    /// Create a new channel set and return it with the event receiver.
    pub fn new(event_buffer: usize, notice_buffer: usize) -> (Self, mpsc::Receiver<StoreEvent>) {
        let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
        let (notice_tx, _) = broadcast::channel(notice_buffer.max(1));

        (
            Self {
                event_tx,
                notice_tx,
            },
            event_rx,
        )
    }

    /// Clone the event sender.
    pub fn event_sender(&self) -> mpsc::Sender<StoreEvent> {
        self.event_tx.clone()
    }

    /// Clone the notice sender.
    pub fn notice_sender(&self) -> broadcast::Sender<StoreNotice> {
        self.notice_tx.clone()
    }

    /// Subscribe to user-facing notices.
    pub fn subscribe_notices(&self) -> NoticeStream {
        self.notice_tx.subscribe()
    }

    /// Queue one event for the dispatch loop.
    ///
    /// Events are consumed strictly in delivery order by a single consumer.
    pub async fn send_event(&self, event: StoreEvent) -> Result<(), StoreChannelError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| StoreChannelError::EventChannelClosed)
    }

    /// Emit a notice to all subscribers.
    ///
    /// Emission is best-effort; lagged subscribers are handled by `broadcast`.
    pub fn emit_notice(&self, notice: StoreNotice) {
        let _ = self.notice_tx.send(notice);
    }
}
