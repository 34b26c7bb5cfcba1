use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Another instance of the application reachable on the local network.
///
/// Identity is `id` and stays stable across discovery refreshes; `ip` and
/// `port` are whatever the most recent announcement advertised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDevice {
    pub id: String,
    pub name: String,
    pub ip: IpAddr,
    pub port: u16,
}

impl PeerDevice {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

/// A note as it travels between peers: a detached snapshot, not a handle
/// into anybody's store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub datetime: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            datetime: Utc::now(),
            attachments: Vec::new(),
        }
    }
}

/// One attachment blob riding along with a shared note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPayload {
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub size: u64,
    pub sha256: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl AttachmentPayload {
    pub fn from_bytes(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            size: data.len() as u64,
            sha256: crate::crypto::sha256_from_bytes(&data),
            data,
        }
    }
}

/// Who a share request came from. The receiver derives the sender's address
/// from the connection itself; only the advertised port rides in the message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderInfo {
    pub id: String,
    pub name: String,
    pub port: u16,
}

/// A note plus its attachments, offered to a peer for acceptance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareRequestMessage {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub sender: SenderInfo,
    pub note: Note,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

/// The receiver's accept/reject decision, correlated by request id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareAckMessage {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub accepted: bool,
}

/// Presence datagram broadcast on the multicast group. `announce: true`
/// asks listeners to make themselves known in return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementMessage {
    pub id: String,
    pub name: String,
    pub version: String,
    pub port: u16,
    #[serde(default)]
    pub announce: bool,
}

impl AnnouncementMessage {
    /// Build the peer entry for an announcement received from `src`.
    pub fn into_peer(self, src: SocketAddr) -> PeerDevice {
        PeerDevice {
            id: self.id,
            name: self.name,
            ip: src.ip(),
            port: self.port,
        }
    }
}

/// Attachment bytes travel base64-encoded so the whole message stays
/// self-describing JSON.
mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn attachment_payload_round_trips_through_json() {
        let payload = AttachmentPayload::from_bytes("photo.png", vec![0, 159, 146, 150]);
        let json = serde_json::to_string(&payload).unwrap();
        // Raw bytes must not leak into the JSON as an array
        assert!(json.contains("\"data\":\""));

        let back: AttachmentPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.size, 4);
    }

    #[test]
    fn announcement_into_peer_uses_source_ip_and_advertised_port() {
        let ann = AnnouncementMessage {
            id: "dev-1".to_string(),
            name: "Laptop".to_string(),
            version: crate::protocol::PROTOCOL_VERSION.to_string(),
            port: 4321,
            announce: true,
        };
        let src = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 7)), 57315);

        let peer = ann.into_peer(src);
        assert_eq!(peer.ip.to_string(), "192.168.1.7");
        assert_eq!(peer.port, 4321);
    }

    #[test]
    fn share_request_defaults_missing_attachments_to_empty() {
        let json = format!(
            r#"{{"requestId":"r1","sender":{{"id":"a","name":"A","port":1}},"note":{{"id":"n1","title":"t","content":"c","datetime":"{}"}}}}"#,
            Utc::now().to_rfc3339()
        );
        let msg: ShareRequestMessage = serde_json::from_str(&json).unwrap();
        assert!(msg.attachments.is_empty());
        assert!(msg.note.attachments.is_empty());
    }
}
