pub mod server;

pub use server::SyncServer;
