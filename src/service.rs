//! Top-level wiring: one [`SyncService`] is one running instance of the
//! peer sync subsystem, exposing the command surface the presentation
//! layer binds to.

use crate::client::SyncClient;
use crate::config::SyncConfig;
use crate::core::device::LocalDevice;
use crate::core::queue::{NotificationQueue, SyncNotification};
use crate::core::registry::PeerRegistry;
use crate::core::share::{NoteShareReport, ShareCoordinator};
use crate::discovery::{Discovery, MulticastDiscovery};
use crate::error::Result;
use crate::events::{EventBus, SyncEvent};
use crate::protocol::{Note, PeerDevice};
use crate::server::SyncServer;
use crate::storage::NoteStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct SyncService {
    device: LocalDevice,
    bus: EventBus,
    registry: Arc<PeerRegistry>,
    queue: Arc<NotificationQueue>,
    store: Arc<dyn NoteStore>,
    coordinator: ShareCoordinator,
    server: SyncServer,
    discovery: MulticastDiscovery,
}

impl SyncService {
    /// Bring up a full instance: share server first (so the announced
    /// port is the bound one), then discovery.
    pub async fn start(config: SyncConfig, store: Arc<dyn NoteStore>) -> Result<Self> {
        let mut device = LocalDevice::new(config.alias.clone(), config.http_port);
        let bus = EventBus::new(config.event_capacity);
        let registry = Arc::new(PeerRegistry::new());
        let queue = Arc::new(NotificationQueue::new(bus.clone()));

        let mut server = SyncServer::new(
            device.clone(),
            registry.clone(),
            queue.clone(),
            config.body_limit,
        );
        let port = server.start().await?;
        device.port = port;

        let coordinator = ShareCoordinator::new(
            device.clone(),
            registry.clone(),
            store.clone(),
            SyncClient::new(config.ack_timeout),
            bus.clone(),
        );

        let mut discovery =
            MulticastDiscovery::new(device.clone(), registry.clone(), bus.clone(), &config);
        if config.enable_discovery {
            discovery.start().await?;
        }

        Ok(Self {
            device,
            bus,
            registry,
            queue,
            store,
            coordinator,
            server,
            discovery,
        })
    }

    // ------------------------------------------------------------------
    // Notes (delegated to the external store)
    // ------------------------------------------------------------------

    pub async fn get_notes(&self) -> Result<Vec<Note>> {
        self.store.list_notes().await
    }

    pub async fn save_note(&self, note: &Note) -> Result<()> {
        self.store.save_note(note).await
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<()> {
        self.store.delete_note(note_id).await
    }

    pub async fn save_attachment(&self, note_id: &str, source: &Path) -> Result<String> {
        self.store.import_attachment(note_id, source).await
    }

    /// Write in-memory bytes (a pasted image, for instance) straight into
    /// the note's attachment area.
    pub async fn save_attachment_bytes(
        &self,
        note_id: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<String> {
        self.store.save_attachment(note_id, file_name, data).await
    }

    pub async fn serve_attachment(&self, note_id: &str, file_name: &str) -> Result<Vec<u8>> {
        self.store.attachment_bytes(note_id, file_name).await
    }

    // ------------------------------------------------------------------
    // Peers & sharing
    // ------------------------------------------------------------------

    pub fn get_peers(&self) -> Vec<PeerDevice> {
        self.registry.list()
    }

    pub async fn share_note(&self, note_id: &str, peer_id: &str) -> NoteShareReport {
        self.coordinator.share_note(note_id, peer_id).await
    }

    pub async fn share_notes(&self, note_ids: &[String], peer_id: &str) -> Vec<NoteShareReport> {
        self.coordinator.share_notes(note_ids, peer_id).await
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn get_sync_notifications(&self) -> Vec<SyncNotification> {
        self.queue.list()
    }

    pub async fn respond_to_sync(
        &self,
        notification_id: &str,
        accept: bool,
    ) -> Result<SyncNotification> {
        self.queue
            .resolve(notification_id, accept, self.store.as_ref())
            .await
    }

    pub fn clear_resolved_notifications(&self) -> usize {
        self.queue.clear_resolved()
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.bus.subscribe()
    }

    pub fn device(&self) -> &LocalDevice {
        &self.device
    }

    pub fn port(&self) -> u16 {
        self.server.port()
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    pub async fn announce_presence(&self) -> Result<()> {
        self.discovery.announce_presence().await
    }

    /// Graceful teardown: cancel pending outbound shares, go silent on
    /// the multicast group, stop accepting inbound requests. Receiver-side
    /// pending notifications on other instances are unaffected.
    pub fn shutdown(&mut self) {
        self.coordinator.shutdown();
        self.discovery.stop();
        self.server.stop();
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
