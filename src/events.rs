//! Process-wide publish/subscribe channel between the sync core and the
//! presentation layer.
//!
//! The bus is an explicit object with an explicit lifecycle: created at
//! startup, handed to every producer, dropped at shutdown. Delivery is
//! best-effort to current subscribers; there is no replay and no
//! persistence.

use crate::core::queue::SyncNotification;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// An event published by the sync core.
#[derive(Clone, Debug)]
pub enum SyncEvent {
    /// The peer registry changed (add, update or evict).
    PeersUpdated,
    /// The local note store changed as a result of an accepted share.
    NotesUpdated,
    /// A notification was created or changed state on this instance.
    SyncNotification { notification: SyncNotification },
    /// An outbound share reached a remote decision.
    SyncResponse {
        note_id: String,
        peer_id: String,
        accepted: bool,
    },
}

impl SyncEvent {
    /// The topic name the presentation layer binds to.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::PeersUpdated => "peers-updated",
            Self::NotesUpdated => "notes-updated",
            Self::SyncNotification { .. } => "sync-notification",
            Self::SyncResponse { .. } => "sync-response",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Publish to whoever is currently listening. A bus with no
    /// subscribers swallows the event.
    pub fn publish(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
