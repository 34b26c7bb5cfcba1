//! Thread-safe registry of peers currently visible on the network.
//!
//! Written only by the discovery service; read by the share coordinator
//! and the UI-facing query surface.

use crate::protocol::PeerDevice;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct PeerEntry {
    device: PeerDevice,
    last_seen: Instant,
}

#[derive(Default)]
struct RegistryInner {
    peers: HashMap<String, PeerEntry>,
    // Insertion order, so list() is stable across refreshes.
    order: Vec<String>,
}

#[derive(Default)]
pub struct PeerRegistry {
    inner: RwLock<RegistryInner>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a peer keyed by its id. Returns `true` when the
    /// announced fields actually changed (new peer, or new ip/port/name),
    /// so callers only publish `peers-updated` on real change; a plain
    /// keep-alive refresh returns `false`.
    pub fn upsert(&self, device: PeerDevice) -> bool {
        let mut inner = self.inner.write();
        match inner.peers.get_mut(&device.id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                let changed = entry.device != device;
                entry.device = device;
                changed
            }
            None => {
                inner.order.push(device.id.clone());
                inner.peers.insert(
                    device.id.clone(),
                    PeerEntry {
                        device,
                        last_seen: Instant::now(),
                    },
                );
                true
            }
        }
    }

    pub fn evict(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.peers.remove(id).is_some() {
            inner.order.retain(|known| known != id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: &str) -> Option<PeerDevice> {
        self.inner.read().peers.get(id).map(|e| e.device.clone())
    }

    /// Snapshot of current peers in insertion order.
    pub fn list(&self) -> Vec<PeerDevice> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.peers.get(id))
            .map(|entry| entry.device.clone())
            .collect()
    }

    /// Evict every peer unseen for longer than `window` and return the
    /// evicted devices.
    pub fn sweep(&self, window: Duration) -> Vec<PeerDevice> {
        let mut inner = self.inner.write();
        let now = Instant::now();
        let stale: Vec<String> = inner
            .peers
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_seen) > window)
            .map(|(id, _)| id.clone())
            .collect();

        let mut evicted = Vec::with_capacity(stale.len());
        for id in &stale {
            if let Some(entry) = inner.peers.remove(id) {
                evicted.push(entry.device);
            }
        }
        if !stale.is_empty() {
            inner.order.retain(|id| !stale.contains(id));
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.read().peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn peer(id: &str, last_octet: u8, port: u16) -> PeerDevice {
        PeerDevice {
            id: id.to_string(),
            name: format!("peer-{id}"),
            ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, last_octet)),
            port,
        }
    }

    #[test]
    fn upsert_never_duplicates_an_id() {
        let registry = PeerRegistry::new();
        assert!(registry.upsert(peer("a", 10, 1000)));
        assert!(registry.upsert(peer("a", 11, 1001)));

        let peers = registry.list();
        assert_eq!(peers.len(), 1);
        // Most recent announcement wins.
        assert_eq!(peers[0].ip.to_string(), "192.168.1.11");
        assert_eq!(peers[0].port, 1001);
    }

    #[test]
    fn keep_alive_refresh_reports_no_change() {
        let registry = PeerRegistry::new();
        assert!(registry.upsert(peer("a", 10, 1000)));
        assert!(!registry.upsert(peer("a", 10, 1000)));
    }

    #[test]
    fn list_keeps_insertion_order_across_refreshes() {
        let registry = PeerRegistry::new();
        registry.upsert(peer("a", 10, 1));
        registry.upsert(peer("b", 11, 2));
        registry.upsert(peer("c", 12, 3));
        registry.upsert(peer("a", 20, 4));

        let ids: Vec<String> = registry.list().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn sweep_evicts_only_stale_peers() {
        let registry = PeerRegistry::new();
        registry.upsert(peer("old", 10, 1));
        std::thread::sleep(Duration::from_millis(30));
        registry.upsert(peer("fresh", 11, 2));

        let evicted = registry.sweep(Duration::from_millis(15));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, "old");

        let remaining = registry.list();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "fresh");
    }

    #[test]
    fn evict_unknown_id_is_a_no_op() {
        let registry = PeerRegistry::new();
        registry.upsert(peer("a", 10, 1));
        assert!(!registry.evict("nope"));
        assert_eq!(registry.len(), 1);
    }
}
