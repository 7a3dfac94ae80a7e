use anyhow::{Context, Result};
use clap::Parser;
use devconnect_client::cli::{handle_command, resolve_config, Cli};
use std::fs::OpenOptions;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    // Initialize logging before any request goes out
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(&config.storage.log_file)
        .with_context(|| format!("Failed to open log file {}", config.storage.log_file.display()))?;

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!("API: {}", config.client.api_url);
    info!("Credentials: {}", config.storage.credential_path.display());

    if let Err(e) = handle_command(cli, &config).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    Ok(())
}
