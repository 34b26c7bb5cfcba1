pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::discover::DiscoverCommand;
pub use commands::discover::execute as run_discover;
pub use commands::listen::ListenCommand;
pub use commands::listen::execute as run_listen;
pub use commands::send::SendCommand;
pub use commands::send::execute as run_send;
