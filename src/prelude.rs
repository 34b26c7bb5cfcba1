//! Prelude module for convenient imports
//!
//! Use `use notesync_rs::prelude::*;` to import commonly used types

// Core types
pub use crate::core::{
    LocalDevice, NoteShareReport, NotificationQueue, PeerRegistry, ShareCoordinator, ShareOutcome,
    SyncNotification, SyncStatus, device_name, get_local_ip,
};

// Protocol types
pub use crate::protocol::{
    AnnouncementMessage, AttachmentPayload, DEFAULT_ACK_TIMEOUT, DEFAULT_ANNOUNCE_INTERVAL,
    DEFAULT_HTTP_PORT, DEFAULT_LIVENESS_WINDOW, DEFAULT_MULTICAST_ADDRESS, DEFAULT_MULTICAST_PORT,
    Note, PROTOCOL_VERSION, PeerDevice, SenderInfo, ShareAckMessage, ShareRequestMessage,
    validate_announcement, validate_protocol_version, validate_share_request,
};

// Client & Server
pub use crate::client::SyncClient;
pub use crate::server::SyncServer;

// Service facade & config
pub use crate::config::SyncConfig;
pub use crate::service::SyncService;

// Discovery
pub use crate::discovery::{Discovery, MulticastDiscovery};

// Events
pub use crate::events::{EventBus, SyncEvent};

// Storage
pub use crate::storage::{FsNoteStore, MemoryNoteStore, NoteStore};

// Error handling
pub use crate::error::{Result, SyncError};
