use crate::config::SyncConfig;
use crate::core::device::LocalDevice;
use crate::core::registry::PeerRegistry;
use crate::discovery::{Discovery, MulticastDiscovery};
use crate::events::EventBus;
use crate::protocol::{DEFAULT_HTTP_PORT, PeerDevice};
use clap::Parser;
use colored::Colorize;
use comfy_table::Table;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "discover", about = "Discover sync peers on the network")]
pub struct DiscoverCommand {
    /// How long to collect announcements, in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    #[arg(short, long)]
    json: bool,
}

pub async fn execute(command: DiscoverCommand) -> anyhow::Result<()> {
    let config = SyncConfig::default();
    let device = LocalDevice::new(None, DEFAULT_HTTP_PORT);
    let registry = Arc::new(PeerRegistry::new());

    let mut discovery =
        MulticastDiscovery::new(device, registry.clone(), EventBus::default(), &config);
    discovery.start().await?;
    discovery.announce_presence().await?;

    tokio::time::sleep(Duration::from_secs(command.timeout)).await;
    discovery.stop();

    let peers = registry.list();
    if command.json {
        println!("{}", serde_json::to_string_pretty(&peers)?);
    } else {
        display_peers(&peers);
    }

    Ok(())
}

fn display_peers(peers: &[PeerDevice]) {
    if peers.is_empty() {
        println!("{}", "No peers discovered".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "ID", "Address"]);
    for peer in peers {
        table.add_row(vec![
            peer.name.clone(),
            peer.id.clone(),
            peer.addr().to_string(),
        ]);
    }
    println!("{table}");
}
