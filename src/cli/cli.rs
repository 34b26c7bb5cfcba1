use crate::cli::commands::{DiscoverCommand, ListenCommand, SendCommand};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notesync", about = "Share notes with peers on the local network", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Listen(ListenCommand),
    Discover(DiscoverCommand),
    Send(SendCommand),
}
