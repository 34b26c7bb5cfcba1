use crate::core::device::LocalDevice;
use crate::core::queue::NotificationQueue;
use crate::core::registry::PeerRegistry;
use crate::error::Result;
use crate::protocol::{
    AnnouncementMessage, INFO_PATH, PeerDevice, SHARE_PATH, ShareAckMessage, ShareRequestMessage,
    validate_share_request,
};
use axum::{
    Json, Router,
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;

/// Inbound half of the transfer protocol. Accepts share requests at any
/// time; the accept/reject decision travels back on the same connection
/// once the user resolves the notification.
pub struct SyncServer {
    device: LocalDevice,
    registry: Arc<PeerRegistry>,
    queue: Arc<NotificationQueue>,
    body_limit: usize,
    port: u16,
    handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

struct ServerState {
    device: LocalDevice,
    registry: Arc<PeerRegistry>,
    queue: Arc<NotificationQueue>,
}

impl SyncServer {
    pub fn new(
        device: LocalDevice,
        registry: Arc<PeerRegistry>,
        queue: Arc<NotificationQueue>,
        body_limit: usize,
    ) -> Self {
        Self {
            device,
            registry,
            queue,
            body_limit,
            port: 0,
            handle: None,
            shutdown_tx: None,
        }
    }

    /// Bind and serve. Binding port 0 picks an ephemeral port; the actual
    /// port is returned and `self.device` updated to announce it.
    pub async fn start(&mut self) -> Result<u16> {
        let listener = TcpListener::bind(("0.0.0.0", self.device.port)).await?;
        let port = listener.local_addr()?.port();
        self.device.port = port;
        self.port = port;

        let state = Arc::new(ServerState {
            device: self.device.clone(),
            registry: self.registry.clone(),
            queue: self.queue.clone(),
        });

        let router = create_router(state).layer(
            ServiceBuilder::new().layer(DefaultBodyLimit::max(self.body_limit)),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            let serve = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });

            if let Err(err) = serve.await {
                tracing::error!("share server error: {err}");
            }
        });
        self.handle = Some(handle);

        tracing::info!(port, "share server listening");
        Ok(port)
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Parked share handlers hold their connections open indefinitely;
        // graceful shutdown alone would wait on them forever.
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn device(&self) -> &LocalDevice {
        &self.device
    }
}

fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(INFO_PATH, get(handle_info))
        .route(SHARE_PATH, post(handle_share))
        .with_state(state)
}

async fn handle_info(State(state): State<Arc<ServerState>>) -> Json<AnnouncementMessage> {
    Json(state.device.announcement(false))
}

/// Admit a share request, park until the user decides, answer with the
/// decision. Malformed requests are refused without creating a
/// notification; a duplicate of a still-pending request id is refused so
/// one logical share cannot notify twice.
async fn handle_share(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Json(request): Json<ShareRequestMessage>,
) -> std::result::Result<Json<ShareAckMessage>, (StatusCode, String)> {
    if let Err(err) = validate_share_request(&request) {
        tracing::warn!(remote = %remote, error = %err, "rejecting malformed share request");
        return Err((StatusCode::BAD_REQUEST, err.to_string()));
    }

    // Snapshot the sender: prefer what discovery knows, otherwise build an
    // entry from the connection's source address and the advertised port.
    let from_peer = state
        .registry
        .get(&request.sender.id)
        .unwrap_or_else(|| PeerDevice {
            id: request.sender.id.clone(),
            name: request.sender.name.clone(),
            ip: remote.ip(),
            port: request.sender.port,
        });

    let request_id = request.request_id.clone();
    let (notification_id, ack_rx) = state
        .queue
        .insert(from_peer, request_id.clone(), request.note, request.attachments)
        .map_err(|err| match err {
            crate::error::SyncError::DuplicateRequest { .. } => {
                (StatusCode::CONFLICT, err.to_string())
            }
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;

    tracing::debug!(%notification_id, "waiting for user decision");
    match ack_rx.await {
        Ok(accepted) => Ok(Json(ShareAckMessage {
            request_id,
            accepted,
        })),
        // Queue dropped without resolving: we are shutting down.
        Err(_) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "shutting down".to_string(),
        )),
    }
}
