pub mod discover;
pub mod listen;
pub mod send;

pub use discover::DiscoverCommand;
pub use listen::ListenCommand;
pub use send::SendCommand;

pub use discover::execute as run_discover;
pub use listen::execute as run_listen;
pub use send::execute as run_send;
