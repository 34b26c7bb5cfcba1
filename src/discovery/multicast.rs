//! UDP multicast presence: announce this instance, track everyone else.

use crate::config::SyncConfig;
use crate::core::device::LocalDevice;
use crate::core::registry::PeerRegistry;
use crate::discovery::Discovery;
use crate::error::{Result, SyncError};
use crate::events::{EventBus, SyncEvent};
use crate::protocol::{AnnouncementMessage, MAX_ANNOUNCE_BACKOFF, validate_announcement};
use socket2::{Domain, Protocol as SocketProtocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

pub struct MulticastDiscovery {
    device: LocalDevice,
    registry: Arc<PeerRegistry>,
    bus: EventBus,
    multicast_address: Ipv4Addr,
    multicast_port: u16,
    announce_interval: Duration,
    liveness_window: Duration,
    socket: Option<Arc<UdpSocket>>,
    running: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl MulticastDiscovery {
    pub fn new(
        device: LocalDevice,
        registry: Arc<PeerRegistry>,
        bus: EventBus,
        config: &SyncConfig,
    ) -> Self {
        Self {
            device,
            registry,
            bus,
            multicast_address: config.multicast_address,
            multicast_port: config.multicast_port,
            announce_interval: config.announce_interval,
            liveness_window: config.liveness_window,
            socket: None,
            running: Arc::new(AtomicBool::new(false)),
            tasks: Vec::new(),
        }
    }

    fn group_addr(&self) -> SocketAddr {
        SocketAddr::new(self.multicast_address.into(), self.multicast_port)
    }
}

#[async_trait::async_trait]
impl Discovery for MulticastDiscovery {
    async fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::Relaxed) {
            return Err(SyncError::network("discovery already running"));
        }

        let bind_addr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), self.multicast_port);
        let socket = reusable_multicast_socket(&bind_addr)?;
        socket.join_multicast_v4(self.multicast_address, Ipv4Addr::UNSPECIFIED)?;

        let socket = Arc::new(socket);
        self.socket = Some(socket.clone());
        self.running.store(true, Ordering::Relaxed);

        self.tasks.push(spawn_listener(
            socket.clone(),
            self.device.clone(),
            self.registry.clone(),
            self.bus.clone(),
            self.group_addr(),
            self.running.clone(),
        ));
        self.tasks.push(spawn_announcer(
            socket,
            self.device.clone(),
            self.group_addr(),
            self.announce_interval,
            self.running.clone(),
        ));
        self.tasks.push(spawn_sweeper(
            self.registry.clone(),
            self.bus.clone(),
            self.announce_interval,
            self.liveness_window,
            self.running.clone(),
        ));

        tracing::info!(
            group = %self.group_addr(),
            device = %self.device.name,
            "discovery started"
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.socket = None;
    }

    async fn announce_presence(&self) -> Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| SyncError::network("discovery not started"))?;
        send_announcement(socket, &self.device, self.group_addr(), true).await
    }
}

async fn send_announcement(
    socket: &UdpSocket,
    device: &LocalDevice,
    group: SocketAddr,
    announce: bool,
) -> Result<()> {
    let message = serde_json::to_string(&device.announcement(announce))?;
    socket.send_to(message.as_bytes(), group).await?;
    Ok(())
}

fn spawn_listener(
    socket: Arc<UdpSocket>,
    device: LocalDevice,
    registry: Arc<PeerRegistry>,
    bus: EventBus,
    group: SocketAddr,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 65536];

        while running.load(Ordering::Relaxed) {
            let (len, src) =
                match tokio::time::timeout(Duration::from_secs(1), socket.recv_from(&mut buf))
                    .await
                {
                    Ok(Ok(received)) => received,
                    // Timeout or transient recv error; keep listening.
                    Ok(Err(_)) | Err(_) => continue,
                };
            if len == 0 {
                continue;
            }

            let announcement = match serde_json::from_slice::<AnnouncementMessage>(&buf[..len]) {
                Ok(announcement) => announcement,
                Err(err) => {
                    tracing::debug!(%src, "discarding undecodable datagram: {err}");
                    continue;
                }
            };

            if announcement.id == device.id {
                continue;
            }
            if let Err(err) = validate_announcement(&announcement) {
                tracing::debug!(%src, "discarding malformed announcement: {err}");
                continue;
            }

            let wants_reply = announcement.announce;
            let peer = announcement.into_peer(src);
            let peer_name = peer.name.clone();
            let changed = registry.upsert(peer);
            if changed {
                tracing::debug!(peer = %peer_name, %src, "peer registered");
                bus.publish(SyncEvent::PeersUpdated);
            }

            // Answer a newcomer's announcement so it learns us without
            // waiting out our announce interval. The reply does not set
            // `announce`, which keeps the exchange from echoing forever.
            if wants_reply && changed {
                if let Err(err) = send_announcement(&socket, &device, group, false).await {
                    tracing::debug!("failed to answer announcement: {err}");
                }
            }
        }
    })
}

fn spawn_announcer(
    socket: Arc<UdpSocket>,
    device: LocalDevice,
    group: SocketAddr,
    interval: Duration,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut delay = interval;
        while running.load(Ordering::Relaxed) {
            match send_announcement(&socket, &device, group, true).await {
                Ok(()) => delay = interval,
                Err(err) => {
                    tracing::warn!("announcement failed, backing off: {err}");
                    delay = (delay * 2).min(MAX_ANNOUNCE_BACKOFF);
                }
            }
            tokio::time::sleep(delay).await;
        }
    })
}

fn spawn_sweeper(
    registry: Arc<PeerRegistry>,
    bus: EventBus,
    interval: Duration,
    window: Duration,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a freshly started
        // service does not sweep before anyone could announce.
        ticker.tick().await;

        while running.load(Ordering::Relaxed) {
            ticker.tick().await;
            let evicted = registry.sweep(window);
            if evicted.is_empty() {
                continue;
            }
            for peer in &evicted {
                tracing::info!(peer = %peer.name, id = %peer.id, "peer timed out");
            }
            bus.publish(SyncEvent::PeersUpdated);
        }
    })
}

/// Creates a UDP socket with port reuse enabled.
///
/// Every instance on the machine must be able to bind the same fixed
/// multicast port; with SO_REUSEADDR (and SO_REUSEPORT on Unix) the OS
/// delivers each multicast packet to all participating sockets.
fn reusable_multicast_socket(bind_addr: &SocketAddr) -> Result<UdpSocket> {
    let domain = if bind_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(SocketProtocol::UDP))
        .map_err(|e| SyncError::network(format!("failed to create socket: {e}")))?;

    socket
        .set_reuse_address(true)
        .map_err(|e| SyncError::network(format!("failed to set reuse_address: {e}")))?;

    #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
    socket
        .set_reuse_port(true)
        .map_err(|e| SyncError::network(format!("failed to set reuse_port: {e}")))?;

    socket
        .bind(&(*bind_addr).into())
        .map_err(|e| SyncError::network(format!("failed to bind to {bind_addr}: {e}")))?;

    let std_socket: std::net::UdpSocket = socket.into();
    std_socket
        .set_nonblocking(true)
        .map_err(|e| SyncError::network(format!("failed to set non-blocking: {e}")))?;

    UdpSocket::from_std(std_socket)
        .map_err(|e| SyncError::network(format!("failed to convert to tokio socket: {e}")))
}
