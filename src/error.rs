use thiserror::Error;

/// Errors that can occur when syncing notes between peers
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    // ============================================================================
    // I/O and System Errors
    // ============================================================================
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serde JSON error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    // ============================================================================
    // Network Errors
    // ============================================================================
    #[error("HTTP client error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    #[error("Address parse error: {source}")]
    AddrParse {
        #[from]
        source: std::net::AddrParseError,
    },

    #[error("Network error: {message}")]
    Network { message: String },

    // ============================================================================
    // Share Errors
    // ============================================================================
    #[error("Unknown peer: {peer_id}")]
    UnknownPeer { peer_id: String },

    #[error("Peer {peer_id} unreachable at {addr}")]
    PeerUnreachable { peer_id: String, addr: String },

    #[error("Timed out waiting for a decision from peer {peer_id}")]
    ShareTimedOut { peer_id: String },

    #[error("Share of note {note_id} to peer {peer_id} is already in flight")]
    ShareAlreadyInFlight { note_id: String, peer_id: String },

    #[error("Share was cancelled before the peer answered")]
    ShareCancelled,

    #[error("Share request {request_id} is already pending on the receiver")]
    DuplicateRequest { request_id: String },

    // ============================================================================
    // Notification Errors
    // ============================================================================
    #[error("Notification {notification_id} not found")]
    NotificationNotFound { notification_id: String },

    #[error("Notification {notification_id} was already resolved")]
    AlreadyResolved { notification_id: String },

    // ============================================================================
    // Protocol Errors
    // ============================================================================
    #[error("Malformed message: {message}")]
    MalformedMessage { message: String },

    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Request failed with HTTP {status}: {message}")]
    HttpFailed { status: u16, message: String },

    // ============================================================================
    // Store Errors
    // ============================================================================
    #[error("Note {note_id} not found")]
    NoteNotFound { note_id: String },

    #[error("Attachment {file_name} not found for note {note_id}")]
    AttachmentNotFound { note_id: String, file_name: String },

    #[error("Store error: {message}")]
    Store { message: String },
}

impl SyncError {
    /// Create a network error with a message
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
        }
    }

    /// Create a malformed message error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: msg.into(),
        }
    }

    /// Create a store error with a message
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
        }
    }

    /// Create an unknown peer error
    pub fn unknown_peer(peer_id: impl Into<String>) -> Self {
        Self::UnknownPeer {
            peer_id: peer_id.into(),
        }
    }

    /// Create an HTTP failed error
    pub fn http_failed(status: u16, message: impl Into<String>) -> Self {
        Self::HttpFailed {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
