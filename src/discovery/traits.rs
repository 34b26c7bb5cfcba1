use crate::error::Result;
use async_trait::async_trait;

/// Keeps the peer registry eventually consistent with reachable peers.
/// Discovered peers land in the registry; changes go out on the event bus.
#[async_trait]
pub trait Discovery {
    async fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    async fn announce_presence(&self) -> Result<()>;
}
