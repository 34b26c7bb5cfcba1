#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;
    use notesync_rs::cli::{Cli, Commands};
    use notesync_rs::cli::{run_discover, run_listen, run_send};

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Listen(cmd) => {
            run_listen(cmd).await?;
        }
        Commands::Discover(cmd) => {
            run_discover(cmd).await?;
        }
        Commands::Send(cmd) => {
            run_send(cmd).await?;
        }
    }

    Ok(())
}
