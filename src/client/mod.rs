pub mod client;

pub use client::SyncClient;
