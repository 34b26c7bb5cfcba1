use crate::client::SyncClient;
use crate::config::SyncConfig;
use crate::core::device::LocalDevice;
use crate::core::registry::PeerRegistry;
use crate::core::share::{ShareCoordinator, ShareOutcome};
use crate::discovery::{Discovery, MulticastDiscovery};
use crate::events::EventBus;
use crate::protocol::PeerDevice;
use crate::storage::FsNoteStore;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "send", about = "Share notes with a peer")]
pub struct SendCommand {
    /// Peer to share with: name, id or ip
    target: String,

    /// Ids of the notes to share
    #[arg(required = true)]
    notes: Vec<String>,

    /// Directory holding this instance's notes
    #[arg(short, long, default_value = "./notes")]
    directory: PathBuf,

    /// How long to search for the peer, in seconds
    #[arg(long, default_value = "5")]
    discover_timeout: u64,

    /// How long to wait for the peer's decision, in seconds
    #[arg(long)]
    ack_timeout: Option<u64>,
}

pub async fn execute(command: SendCommand) -> anyhow::Result<()> {
    let mut config = SyncConfig::default();
    if let Some(secs) = command.ack_timeout {
        config.ack_timeout = Duration::from_secs(secs);
    }

    let device = LocalDevice::new(None, crate::protocol::DEFAULT_HTTP_PORT);
    let registry = Arc::new(PeerRegistry::new());
    let bus = EventBus::default();

    let mut discovery =
        MulticastDiscovery::new(device.clone(), registry.clone(), bus.clone(), &config);
    discovery.start().await?;
    discovery.announce_presence().await?;

    println!("Searching for peer '{}'...", command.target);
    let peer = wait_for_peer(&registry, &command.target, command.discover_timeout).await;
    discovery.stop();

    let Some(peer) = peer else {
        anyhow::bail!("could not resolve peer: {}", command.target);
    };
    println!("Sending to: {} ({})", peer.name.bold(), peer.addr());

    let store = Arc::new(FsNoteStore::new(&command.directory));
    let coordinator = ShareCoordinator::new(
        device,
        registry,
        store,
        SyncClient::new(config.ack_timeout),
        bus,
    );

    let reports = coordinator.share_notes(&command.notes, &peer.id).await;
    let mut failures = 0usize;
    for report in &reports {
        match &report.outcome {
            ShareOutcome::Accepted => {
                println!("{} {} accepted", "ok".green(), report.note_id);
            }
            ShareOutcome::Rejected => {
                println!("{} {} rejected by peer", "--".yellow(), report.note_id);
            }
            ShareOutcome::Failed(err) => {
                failures += 1;
                println!("{} {} failed: {err}", "!!".red(), report.note_id);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} share(s) failed", reports.len());
    }
    Ok(())
}

async fn wait_for_peer(
    registry: &PeerRegistry,
    target: &str,
    timeout_secs: u64,
) -> Option<PeerDevice> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        let found = registry.list().into_iter().find(|peer| {
            peer.id == target || peer.name == target || peer.ip.to_string() == target
        });
        if found.is_some() {
            return found;
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
