use crate::protocol::{
    DEFAULT_ACK_TIMEOUT, DEFAULT_ANNOUNCE_INTERVAL, DEFAULT_BODY_LIMIT, DEFAULT_HTTP_PORT,
    DEFAULT_LIVENESS_WINDOW, DEFAULT_MULTICAST_ADDRESS, DEFAULT_MULTICAST_PORT,
};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Runtime configuration for a sync instance.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Display name announced to peers; machine hostname when `None`.
    pub alias: Option<String>,
    /// Port for the HTTP share endpoint; 0 picks an ephemeral port.
    pub http_port: u16,
    pub multicast_address: Ipv4Addr,
    pub multicast_port: u16,
    pub announce_interval: Duration,
    /// A peer unseen this long is evicted. Keep it a small multiple of
    /// the announce interval.
    pub liveness_window: Duration,
    /// How long an outbound share waits for the remote decision.
    pub ack_timeout: Duration,
    /// Largest accepted inbound share body.
    pub body_limit: usize,
    /// Event bus channel capacity.
    pub event_capacity: usize,
    /// Multicast discovery can be switched off when peers are registered
    /// by other means (tests, fixed fleet configs).
    pub enable_discovery: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            alias: None,
            http_port: DEFAULT_HTTP_PORT,
            multicast_address: DEFAULT_MULTICAST_ADDRESS,
            multicast_port: DEFAULT_MULTICAST_PORT,
            announce_interval: DEFAULT_ANNOUNCE_INTERVAL,
            liveness_window: DEFAULT_LIVENESS_WINDOW,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            body_limit: DEFAULT_BODY_LIMIT,
            event_capacity: 64,
            enable_discovery: true,
        }
    }
}
