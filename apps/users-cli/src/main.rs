use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use users_client::{UsersClient, UsersClientConfig};
use users_sdk::UsersClientV1;

mod commands;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(name = "users-cli")]
struct Cli {
    /// Configuration file (default: ./users-client.yaml when present)
    #[arg(short = 'c', long, env = "USERS_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = UsersClientConfig::load(cli.config.as_deref())?;
    let client: Arc<dyn UsersClientV1> = Arc::new(UsersClient::new(&config)?);
    tracing::debug!(backend_url = %config.backend_url, command = cli.command.name(), "running");

    let output = cli.command.run(client.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
