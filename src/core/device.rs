use crate::error::{Result, SyncError};
use crate::protocol::{AnnouncementMessage, PROTOCOL_VERSION, SenderInfo};

/// This instance's identity as announced to the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalDevice {
    pub id: String,
    pub name: String,
    pub port: u16,
}

impl LocalDevice {
    /// Create a device identity with a fresh id. `name` falls back to the
    /// machine hostname when not given.
    pub fn new(name: Option<String>, port: u16) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.unwrap_or_else(device_name),
            port,
        }
    }

    pub fn announcement(&self, announce: bool) -> AnnouncementMessage {
        AnnouncementMessage {
            id: self.id.clone(),
            name: self.name.clone(),
            version: PROTOCOL_VERSION.to_string(),
            port: self.port,
            announce,
        }
    }

    pub fn sender_info(&self) -> SenderInfo {
        SenderInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            port: self.port,
        }
    }
}

pub fn device_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown-device".to_string())
}

/// Best local IPv4 guess, via the routing table rather than interface
/// enumeration. No packet is actually sent.
pub fn get_local_ip() -> Result<std::net::Ipv4Addr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    let local_addr = socket.local_addr()?.ip();
    match local_addr {
        std::net::IpAddr::V4(addr) => Ok(addr),
        _ => Err(SyncError::network("local IP is not IPv4")),
    }
}
