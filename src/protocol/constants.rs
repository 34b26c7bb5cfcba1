use std::net::Ipv4Addr;
use std::time::Duration;

/// Protocol version carried in announcements; major versions must match.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Default port for the HTTP share endpoint.
pub const DEFAULT_HTTP_PORT: u16 = 57316;

/// Multicast group used for peer discovery.
pub const DEFAULT_MULTICAST_ADDRESS: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 199);
pub const DEFAULT_MULTICAST_PORT: u16 = 57315;

/// How often this instance announces itself on the multicast group.
pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(5);

/// A peer unseen for longer than this is evicted (3x the announce interval).
pub const DEFAULT_LIVENESS_WINDOW: Duration = Duration::from_secs(15);

/// Cap for the announcer's backoff after repeated send failures.
pub const MAX_ANNOUNCE_BACKOFF: Duration = Duration::from_secs(60);

/// How long a sender waits for the receiver's accept/reject decision.
/// Deliberately generous: the wait ends when a human acts on the
/// notification, not when a socket round-trips.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(600);

/// Largest accepted share request body (note + attachments).
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

pub const INFO_PATH: &str = "/api/notesync/v1/info";
pub const SHARE_PATH: &str = "/api/notesync/v1/share";
