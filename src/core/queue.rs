//! Receiver-side store of inbound share requests awaiting a user decision.
//!
//! Entries are kept in arrival order and retained after resolution for
//! history; only `clear_resolved` removes them. Resolution is single-shot:
//! a notification goes from `Pending` to exactly one terminal state, and
//! any later attempt fails with `AlreadyResolved` regardless of the
//! decision it carries.

use crate::error::{Result, SyncError};
use crate::events::{EventBus, SyncEvent};
use crate::protocol::{AttachmentPayload, Note, PeerDevice};
use crate::storage::NoteStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A record of an incoming share, shown to the user for a decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncNotification {
    pub id: String,
    #[serde(rename = "fromPeer")]
    pub from_peer: PeerDevice,
    #[serde(rename = "noteTitle")]
    pub note_title: String,
    pub status: SyncStatus,
}

/// The transferred payload, parked until the user decides. `ack_tx` is the
/// sender's open connection waiting for the decision.
struct PendingDelivery {
    note: Note,
    attachments: Vec<AttachmentPayload>,
    ack_tx: oneshot::Sender<bool>,
}

struct QueueEntry {
    notification: SyncNotification,
    request_id: String,
    payload: Option<PendingDelivery>,
    // Serializes concurrent resolve() calls for this one notification.
    resolve_lock: Arc<tokio::sync::Mutex<()>>,
}

pub struct NotificationQueue {
    bus: EventBus,
    inner: Mutex<Vec<QueueEntry>>,
}

impl NotificationQueue {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Admit an inbound share: create a `Pending` notification, park the
    /// payload, and publish `sync-notification`. Returns the notification
    /// id and the receiver half of the ack channel for the transport to
    /// await on.
    ///
    /// A request id that is already pending is refused so one logical
    /// share can never produce two notifications.
    pub fn insert(
        &self,
        from_peer: PeerDevice,
        request_id: String,
        note: Note,
        attachments: Vec<AttachmentPayload>,
    ) -> Result<(String, oneshot::Receiver<bool>)> {
        let (ack_tx, ack_rx) = oneshot::channel();

        let notification = {
            let mut inner = self.inner.lock();

            let duplicate = inner.iter().any(|entry| {
                entry.request_id == request_id
                    && entry.notification.status == SyncStatus::Pending
            });
            if duplicate {
                return Err(SyncError::DuplicateRequest { request_id });
            }

            let notification = SyncNotification {
                id: uuid::Uuid::new_v4().to_string(),
                from_peer,
                note_title: note.title.clone(),
                status: SyncStatus::Pending,
            };

            inner.push(QueueEntry {
                notification: notification.clone(),
                request_id,
                payload: Some(PendingDelivery {
                    note,
                    attachments,
                    ack_tx,
                }),
                resolve_lock: Arc::new(tokio::sync::Mutex::new(())),
            });

            notification
        };

        tracing::info!(
            notification_id = %notification.id,
            peer = %notification.from_peer.name,
            title = %notification.note_title,
            "incoming share queued"
        );
        let id = notification.id.clone();
        self.bus.publish(SyncEvent::SyncNotification { notification });

        Ok((id, ack_rx))
    }

    /// All notifications in arrival order, resolved ones included.
    pub fn list(&self) -> Vec<SyncNotification> {
        self.inner
            .lock()
            .iter()
            .map(|entry| entry.notification.clone())
            .collect()
    }

    pub fn get(&self, notification_id: &str) -> Option<SyncNotification> {
        self.inner
            .lock()
            .iter()
            .find(|entry| entry.notification.id == notification_id)
            .map(|entry| entry.notification.clone())
    }

    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .iter()
            .filter(|entry| entry.notification.status == SyncStatus::Pending)
            .count()
    }

    /// Apply the user's decision.
    ///
    /// On accept the transferred note and attachments are written into the
    /// store before the status flips; a store failure leaves the
    /// notification `Pending` so the user can retry. The decision is
    /// relayed through the parked ack channel either way, and the events
    /// the decision implies are published.
    pub async fn resolve(
        &self,
        notification_id: &str,
        accept: bool,
        store: &dyn NoteStore,
    ) -> Result<SyncNotification> {
        let resolve_lock = {
            let inner = self.inner.lock();
            let entry = inner
                .iter()
                .find(|entry| entry.notification.id == notification_id)
                .ok_or_else(|| SyncError::NotificationNotFound {
                    notification_id: notification_id.to_string(),
                })?;
            entry.resolve_lock.clone()
        };

        // Concurrent resolvers queue here; whoever loses the race observes
        // a terminal status below and fails with AlreadyResolved.
        let _guard = resolve_lock.lock().await;

        let payload = {
            let mut inner = self.inner.lock();
            let entry = find_mut(&mut inner, notification_id)?;
            if entry.notification.status != SyncStatus::Pending {
                return Err(SyncError::AlreadyResolved {
                    notification_id: notification_id.to_string(),
                });
            }
            entry
                .payload
                .take()
                .ok_or_else(|| SyncError::AlreadyResolved {
                    notification_id: notification_id.to_string(),
                })?
        };

        if accept {
            // Attachments land first so the note never surfaces without
            // them; a retry after a failure repeats idempotent upserts.
            if let Err(err) = write_accepted(store, &payload).await {
                let mut inner = self.inner.lock();
                if let Ok(entry) = find_mut(&mut inner, notification_id) {
                    entry.payload = Some(payload);
                }
                tracing::warn!(
                    notification_id,
                    error = %err,
                    "store write failed; notification stays pending"
                );
                return Err(err);
            }
        }

        let resolved = {
            let mut inner = self.inner.lock();
            let entry = find_mut(&mut inner, notification_id)?;
            entry.notification.status = if accept {
                SyncStatus::Accepted
            } else {
                SyncStatus::Rejected
            };
            entry.notification.clone()
        };

        // The original sender may be long gone; that is not an error here.
        let _ = payload.ack_tx.send(accept);

        tracing::info!(notification_id, accept, "share resolved");
        if accept {
            self.bus.publish(SyncEvent::NotesUpdated);
        }
        self.bus.publish(SyncEvent::SyncNotification {
            notification: resolved.clone(),
        });

        Ok(resolved)
    }

    /// Housekeeping: drop resolved notifications, keep pending ones.
    /// Returns how many were removed.
    pub fn clear_resolved(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.len();
        inner.retain(|entry| entry.notification.status == SyncStatus::Pending);
        before - inner.len()
    }
}

fn find_mut<'a>(
    entries: &'a mut Vec<QueueEntry>,
    notification_id: &str,
) -> Result<&'a mut QueueEntry> {
    entries
        .iter_mut()
        .find(|entry| entry.notification.id == notification_id)
        .ok_or_else(|| SyncError::NotificationNotFound {
            notification_id: notification_id.to_string(),
        })
}

async fn write_accepted(store: &dyn NoteStore, payload: &PendingDelivery) -> Result<()> {
    for attachment in &payload.attachments {
        store
            .save_attachment(&payload.note.id, &attachment.file_name, &attachment.data)
            .await?;
    }
    store.save_note(&payload.note).await?;
    Ok(())
}
