pub mod constants;
pub mod types;
pub mod validation;

pub use constants::{
    DEFAULT_ACK_TIMEOUT, DEFAULT_ANNOUNCE_INTERVAL, DEFAULT_BODY_LIMIT, DEFAULT_HTTP_PORT,
    DEFAULT_LIVENESS_WINDOW, DEFAULT_MULTICAST_ADDRESS, DEFAULT_MULTICAST_PORT, INFO_PATH,
    MAX_ANNOUNCE_BACKOFF, PROTOCOL_VERSION, SHARE_PATH,
};
pub use types::{
    AnnouncementMessage, AttachmentPayload, Note, PeerDevice, SenderInfo, ShareAckMessage,
    ShareRequestMessage,
};
pub use validation::{validate_announcement, validate_protocol_version, validate_share_request};
