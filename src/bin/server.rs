use anyhow::Context;
use authgate::collaborators::ResourceRouters;
use authgate::config::{Config, LogFormat};
use authgate::start_server_with_config;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "authgate", version, about = "Session authentication gateway")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())
        .with_context(|| format!("loading configuration from {:?}", args.config))?;

    init_tracing(config.log_format);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    start_server_with_config(config, ResourceRouters::new(), shutdown_rx).await?;

    // Wait for Ctrl-C
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested, stopping server...");

    // Give in-flight requests a short grace period
    let _ = shutdown_tx.send(());
    tokio::time::sleep(Duration::from_millis(200)).await;

    tracing::info!("server stopped");
    Ok(())
}
