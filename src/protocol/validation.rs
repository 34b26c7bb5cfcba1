use crate::crypto::sha256_from_bytes;
use crate::error::{Result, SyncError};
use crate::protocol::{AnnouncementMessage, PROTOCOL_VERSION, ShareRequestMessage};
use std::collections::HashSet;

/// Validates protocol version compatibility.
///
/// Versions follow semantic versioning; the major component must match,
/// minor components may differ.
pub fn validate_protocol_version(version: &str) -> Result<()> {
    let parts: Vec<&str> = version.split('.').collect();
    let expected_parts: Vec<&str> = PROTOCOL_VERSION.split('.').collect();

    if parts.is_empty() || parts[0].is_empty() || parts[0] != expected_parts[0] {
        return Err(SyncError::VersionMismatch {
            expected: PROTOCOL_VERSION.to_string(),
            actual: version.to_string(),
        });
    }

    Ok(())
}

/// Validates a discovery announcement before it may touch the registry.
pub fn validate_announcement(announcement: &AnnouncementMessage) -> Result<()> {
    if announcement.id.trim().is_empty() {
        return Err(SyncError::malformed("announcement id cannot be empty"));
    }

    if announcement.name.trim().is_empty() {
        return Err(SyncError::malformed("announcement name cannot be empty"));
    }

    if announcement.port == 0 {
        return Err(SyncError::malformed("announcement port cannot be zero"));
    }

    validate_protocol_version(&announcement.version)
}

/// Validates an inbound share request before a notification is created.
///
/// The attachment payloads must cover the note's attachment list exactly:
/// a note never becomes visible to the receiver with attachments missing,
/// so a partial delivery is rejected outright.
pub fn validate_share_request(request: &ShareRequestMessage) -> Result<()> {
    if request.request_id.trim().is_empty() {
        return Err(SyncError::malformed("request id cannot be empty"));
    }

    if request.sender.id.trim().is_empty() {
        return Err(SyncError::malformed("sender id cannot be empty"));
    }

    if request.note.id.trim().is_empty() {
        return Err(SyncError::malformed("note id cannot be empty"));
    }

    let listed: HashSet<&str> = request.note.attachments.iter().map(String::as_str).collect();
    if listed.len() != request.note.attachments.len() {
        return Err(SyncError::malformed("note lists duplicate attachment names"));
    }

    let delivered: HashSet<&str> = request
        .attachments
        .iter()
        .map(|a| a.file_name.as_str())
        .collect();
    if delivered.len() != request.attachments.len() {
        return Err(SyncError::malformed("duplicate attachment payloads"));
    }

    if listed != delivered {
        return Err(SyncError::malformed(
            "attachment payloads do not match the note's attachment list",
        ));
    }

    for attachment in &request.attachments {
        if attachment.data.len() as u64 != attachment.size {
            return Err(SyncError::malformed(format!(
                "attachment {} declares {} bytes but carries {}",
                attachment.file_name,
                attachment.size,
                attachment.data.len()
            )));
        }

        if sha256_from_bytes(&attachment.data) != attachment.sha256 {
            return Err(SyncError::malformed(format!(
                "attachment {} failed digest verification",
                attachment.file_name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AttachmentPayload, Note, SenderInfo};

    fn request_with(note_attachments: Vec<&str>, payloads: Vec<AttachmentPayload>) -> ShareRequestMessage {
        let mut note = Note::new("Groceries", "milk, eggs");
        note.attachments = note_attachments.into_iter().map(String::from).collect();
        ShareRequestMessage {
            request_id: "req-1".to_string(),
            sender: SenderInfo {
                id: "peer-1".to_string(),
                name: "Laptop".to_string(),
                port: 57316,
            },
            note,
            attachments: payloads,
        }
    }

    #[test]
    fn validate_protocol_version_compatible() {
        assert!(validate_protocol_version("1.0").is_ok());
        assert!(validate_protocol_version("1.7").is_ok());
    }

    #[test]
    fn validate_protocol_version_incompatible() {
        assert!(validate_protocol_version("2.0").is_err());
        assert!(validate_protocol_version("").is_err());
    }

    #[test]
    fn announcement_requires_id_name_and_port() {
        let mut ann = AnnouncementMessage {
            id: "dev-1".to_string(),
            name: "Laptop".to_string(),
            version: PROTOCOL_VERSION.to_string(),
            port: 57316,
            announce: true,
        };
        assert!(validate_announcement(&ann).is_ok());

        ann.id = "  ".to_string();
        assert!(validate_announcement(&ann).is_err());
        ann.id = "dev-1".to_string();

        ann.port = 0;
        assert!(validate_announcement(&ann).is_err());
    }

    #[test]
    fn share_request_with_matching_attachments_passes() {
        let payload = AttachmentPayload::from_bytes("a.png", vec![1, 2, 3]);
        let request = request_with(vec!["a.png"], vec![payload]);
        assert!(validate_share_request(&request).is_ok());
    }

    #[test]
    fn share_request_missing_attachment_payload_is_malformed() {
        let request = request_with(vec!["a.png"], vec![]);
        assert!(validate_share_request(&request).is_err());
    }

    #[test]
    fn share_request_with_extra_payload_is_malformed() {
        let payload = AttachmentPayload::from_bytes("b.png", vec![1]);
        let request = request_with(vec![], vec![payload]);
        assert!(validate_share_request(&request).is_err());
    }

    #[test]
    fn share_request_with_corrupt_attachment_is_malformed() {
        let mut payload = AttachmentPayload::from_bytes("a.png", vec![1, 2, 3]);
        payload.data = vec![9, 9, 9];
        let request = request_with(vec!["a.png"], vec![payload]);
        assert!(validate_share_request(&request).is_err());
    }

    #[test]
    fn share_request_with_size_mismatch_is_malformed() {
        let mut payload = AttachmentPayload::from_bytes("a.png", vec![1, 2, 3]);
        payload.size = 7;
        let request = request_with(vec!["a.png"], vec![payload]);
        assert!(validate_share_request(&request).is_err());
    }
}
