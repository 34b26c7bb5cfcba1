use crate::error::{Result, SyncError};
use crate::protocol::{INFO_PATH, SHARE_PATH};
use crate::protocol::{AnnouncementMessage, PeerDevice, ShareAckMessage, ShareRequestMessage};
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

/// Point-to-point transfer client. One POST per share; the response is the
/// receiver's accept/reject decision, however long the user takes.
#[derive(Clone)]
pub struct SyncClient {
    client: HttpClient,
    ack_timeout: Duration,
}

impl SyncClient {
    pub fn new(ack_timeout: Duration) -> Self {
        Self {
            // Fresh connection per request: the decision wait is measured
            // in minutes, so pooled idle connections buy nothing.
            client: HttpClient::builder()
                .pool_max_idle_per_host(0)
                .tcp_nodelay(true)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            ack_timeout,
        }
    }

    /// Probe a peer's identity directly by address.
    pub async fn fetch_info(&self, addr: &str) -> Result<AnnouncementMessage> {
        let url = format!("http://{addr}{INFO_PATH}");
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await?;
        Ok(response.json().await?)
    }

    /// Transmit one share request and wait for the decision.
    ///
    /// The request is sent exactly once; there is no implicit retry, so a
    /// logical share can never surface twice on the receiver.
    pub async fn send_share(
        &self,
        peer: &PeerDevice,
        message: &ShareRequestMessage,
    ) -> Result<ShareAckMessage> {
        let url = format!("http://{}{}", peer.addr(), SHARE_PATH);

        let response = self
            .client
            .post(&url)
            .json(message)
            .timeout(self.ack_timeout)
            .send()
            .await
            .map_err(|err| classify_send_error(err, peer))?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let ack: ShareAckMessage = response.json().await?;
                if ack.request_id != message.request_id {
                    return Err(SyncError::malformed(format!(
                        "ack for request {} does not match request {}",
                        ack.request_id, message.request_id
                    )));
                }
                Ok(ack)
            }
            StatusCode::CONFLICT => Err(SyncError::DuplicateRequest {
                request_id: message.request_id.clone(),
            }),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                Err(SyncError::malformed(body))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(SyncError::http_failed(status.as_u16(), body))
            }
        }
    }
}

fn classify_send_error(err: reqwest::Error, peer: &PeerDevice) -> SyncError {
    if err.is_timeout() {
        SyncError::ShareTimedOut {
            peer_id: peer.id.clone(),
        }
    } else if err.is_connect() {
        SyncError::PeerUnreachable {
            peer_id: peer.id.clone(),
            addr: peer.addr().to_string(),
        }
    } else {
        err.into()
    }
}
