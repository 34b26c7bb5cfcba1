pub mod client;
pub mod config;
pub mod core;
pub mod crypto;
pub mod discovery;
pub mod error;
pub mod events;
pub mod protocol;
pub mod server;
pub mod service;
pub mod storage;
pub mod prelude;

// Re-export commonly used types
pub use client::SyncClient;
pub use config::SyncConfig;
pub use crate::core::{
    LocalDevice, NoteShareReport, NotificationQueue, PeerRegistry, ShareCoordinator, ShareOutcome,
    SyncNotification, SyncStatus, device_name, get_local_ip,
};
pub use crypto::sha256_from_bytes;
pub use discovery::{Discovery, MulticastDiscovery};
pub use error::{Result, SyncError};
pub use events::{EventBus, SyncEvent};
pub use protocol::{
    AnnouncementMessage, AttachmentPayload, DEFAULT_HTTP_PORT, DEFAULT_MULTICAST_ADDRESS,
    DEFAULT_MULTICAST_PORT, Note, PROTOCOL_VERSION, PeerDevice, SenderInfo, ShareAckMessage,
    ShareRequestMessage, validate_announcement, validate_protocol_version, validate_share_request,
};
pub use server::SyncServer;
pub use service::SyncService;
pub use storage::{FsNoteStore, MemoryNoteStore, NoteStore};

#[cfg(feature = "cli")]
pub mod cli;
