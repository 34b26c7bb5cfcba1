//! Sender-side orchestration of outbound shares.

use crate::client::SyncClient;
use crate::core::device::LocalDevice;
use crate::core::registry::PeerRegistry;
use crate::error::SyncError;
use crate::events::{EventBus, SyncEvent};
use crate::protocol::{AttachmentPayload, PeerDevice, ShareRequestMessage};
use crate::storage::NoteStore;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Terminal outcome of one note shared to one peer.
#[derive(Debug)]
pub enum ShareOutcome {
    Accepted,
    Rejected,
    Failed(SyncError),
}

impl ShareOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

#[derive(Debug)]
pub struct NoteShareReport {
    pub note_id: String,
    pub peer_id: String,
    pub outcome: ShareOutcome,
}

/// Orchestrates outbound sharing: packages notes with their attachments,
/// issues one transfer request per (note, peer), and reports each outcome
/// independently.
///
/// No two requests for the same (note, peer) pair are ever in flight at
/// once; a second attempt while one is pending fails immediately.
#[derive(Clone)]
pub struct ShareCoordinator {
    device: LocalDevice,
    registry: Arc<PeerRegistry>,
    store: Arc<dyn NoteStore>,
    client: SyncClient,
    bus: EventBus,
    in_flight: Arc<Mutex<HashSet<(String, String)>>>,
    cancel: CancellationToken,
}

impl ShareCoordinator {
    pub fn new(
        device: LocalDevice,
        registry: Arc<PeerRegistry>,
        store: Arc<dyn NoteStore>,
        client: SyncClient,
        bus: EventBus,
    ) -> Self {
        Self {
            device,
            registry,
            store,
            client,
            bus,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            cancel: CancellationToken::new(),
        }
    }

    /// Share one note; a batch of one.
    pub async fn share_note(&self, note_id: &str, peer_id: &str) -> NoteShareReport {
        let ids = [note_id.to_string()];
        let mut reports = self.share_notes(&ids, peer_id).await;
        reports.swap_remove(0)
    }

    /// Share a batch of notes with one peer. Each note travels and fails
    /// independently; the returned reports parallel `note_ids`.
    pub async fn share_notes(&self, note_ids: &[String], peer_id: &str) -> Vec<NoteShareReport> {
        let Some(peer) = self.registry.get(peer_id) else {
            return note_ids
                .iter()
                .map(|note_id| NoteShareReport {
                    note_id: note_id.clone(),
                    peer_id: peer_id.to_string(),
                    outcome: ShareOutcome::Failed(SyncError::unknown_peer(peer_id)),
                })
                .collect();
        };

        let sends = note_ids
            .iter()
            .map(|note_id| self.share_one(note_id.clone(), peer.clone()));
        futures_util::future::join_all(sends).await
    }

    /// Abort every pending wait. The receiver side is untouched: its
    /// notifications stay pending until the user acts.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn share_one(&self, note_id: String, peer: PeerDevice) -> NoteShareReport {
        let key = (note_id.clone(), peer.id.clone());
        {
            let mut guard = self.in_flight.lock();
            if !guard.insert(key.clone()) {
                return NoteShareReport {
                    note_id: note_id.clone(),
                    peer_id: peer.id.clone(),
                    outcome: ShareOutcome::Failed(SyncError::ShareAlreadyInFlight {
                        note_id,
                        peer_id: peer.id,
                    }),
                };
            }
        }

        let outcome = self.transmit(&note_id, &peer).await;
        self.in_flight.lock().remove(&key);

        match &outcome {
            ShareOutcome::Accepted => self.publish_response(&note_id, &peer.id, true),
            ShareOutcome::Rejected => self.publish_response(&note_id, &peer.id, false),
            ShareOutcome::Failed(err) => {
                tracing::warn!(%note_id, peer = %peer.name, error = %err, "share failed");
            }
        }

        NoteShareReport {
            note_id,
            peer_id: peer.id,
            outcome,
        }
    }

    async fn transmit(&self, note_id: &str, peer: &PeerDevice) -> ShareOutcome {
        let note = match self.store.get_note(note_id).await {
            Ok(note) => note,
            Err(err) => return ShareOutcome::Failed(err),
        };

        let mut attachments = Vec::with_capacity(note.attachments.len());
        for file_name in &note.attachments {
            match self.store.attachment_bytes(note_id, file_name).await {
                Ok(data) => attachments.push(AttachmentPayload::from_bytes(file_name, data)),
                Err(err) => return ShareOutcome::Failed(err),
            }
        }

        let message = ShareRequestMessage {
            request_id: uuid::Uuid::new_v4().to_string(),
            sender: self.device.sender_info(),
            note,
            attachments,
        };

        tracing::info!(
            note_id,
            peer = %peer.name,
            request_id = %message.request_id,
            "sharing note"
        );

        tokio::select! {
            _ = self.cancel.cancelled() => ShareOutcome::Failed(SyncError::ShareCancelled),
            result = self.client.send_share(peer, &message) => match result {
                Ok(ack) if ack.accepted => ShareOutcome::Accepted,
                Ok(_) => ShareOutcome::Rejected,
                Err(err) => ShareOutcome::Failed(err),
            },
        }
    }

    fn publish_response(&self, note_id: &str, peer_id: &str, accepted: bool) {
        self.bus.publish(SyncEvent::SyncResponse {
            note_id: note_id.to_string(),
            peer_id: peer_id.to_string(),
            accepted,
        });
    }
}
