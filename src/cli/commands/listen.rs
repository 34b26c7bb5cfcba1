use crate::config::SyncConfig;
use crate::core::queue::SyncStatus;
use crate::events::SyncEvent;
use crate::protocol::DEFAULT_HTTP_PORT;
use crate::service::SyncService;
use crate::storage::FsNoteStore;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "listen", about = "Run a sync instance and receive shared notes")]
pub struct ListenCommand {
    /// Directory holding this instance's notes
    #[arg(short, long, default_value = "./notes")]
    directory: PathBuf,

    #[arg(short, long, default_value_t = DEFAULT_HTTP_PORT)]
    port: u16,

    /// Name announced to peers (defaults to the hostname)
    #[arg(short, long)]
    alias: Option<String>,

    /// Accept every incoming share without prompting
    #[arg(long)]
    auto_accept: bool,
}

pub async fn execute(command: ListenCommand) -> anyhow::Result<()> {
    let store = Arc::new(FsNoteStore::new(&command.directory));
    let config = SyncConfig {
        alias: command.alias,
        http_port: command.port,
        ..SyncConfig::default()
    };

    let mut service = SyncService::start(config, store).await?;
    let mut events = service.subscribe();

    println!(
        "{} {} on {}:{}",
        "Listening as".green(),
        service.device().name.bold(),
        crate::core::get_local_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|_| "0.0.0.0".to_string()),
        service.port()
    );
    println!("Notes directory: {}", command.directory.display());
    if command.auto_accept {
        println!(
            "{}",
            "Auto-accept ENABLED - incoming notes are saved without confirmation!".yellow()
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                let Ok(event) = event else { continue };
                handle_event(&service, event, command.auto_accept).await;
            }
        }
    }

    println!("\nShutting down...");
    service.shutdown();
    Ok(())
}

async fn handle_event(service: &SyncService, event: SyncEvent, auto_accept: bool) {
    match event {
        SyncEvent::PeersUpdated => {
            println!("{} {} peer(s) visible", "*".blue(), service.get_peers().len());
        }
        SyncEvent::NotesUpdated => {
            println!("{}", "* note store updated".green());
        }
        SyncEvent::SyncResponse {
            note_id, accepted, ..
        } => {
            let verdict = if accepted {
                "accepted".green()
            } else {
                "rejected".red()
            };
            println!("* share of note {note_id} was {verdict}");
        }
        SyncEvent::SyncNotification { notification } => {
            if notification.status != SyncStatus::Pending {
                return;
            }

            let accept = if auto_accept {
                true
            } else {
                prompt_decision(&notification.note_title, &notification.from_peer.name).await
            };

            match service.respond_to_sync(&notification.id, accept).await {
                Ok(resolved) => {
                    let verdict = if accept {
                        "accepted".green()
                    } else {
                        "rejected".red()
                    };
                    println!("{} \"{}\" {}", "*".blue(), resolved.note_title, verdict);
                }
                Err(err) => eprintln!("{} {err}", "failed to resolve:".red()),
            }
        }
    }
}

async fn prompt_decision(title: &str, peer_name: &str) -> bool {
    let message = format!("Accept note \"{title}\" from {peer_name}?");
    tokio::task::spawn_blocking(move || {
        inquire::Confirm::new(&message)
            .with_default(true)
            .prompt()
            .unwrap_or(false)
    })
    .await
    .unwrap_or(false)
}
