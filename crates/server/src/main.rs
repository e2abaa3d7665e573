//! Bastion server binary.

use anyhow::{Context, Result};
use bastion_server::bootstrap::{
    DEFAULT_CONFIG_PATH, build_state, check_connectivity, load_config,
};
use bastion_server::create_router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Bastion - admin dashboard backend
#[derive(Parser, Debug)]
#[command(name = "bastiond")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "BASTION_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Bastion v{}", env!("CARGO_PKG_VERSION"));

    // Missing credentials do not stop startup; the affected endpoints report them.
    let config = load_config(&args.config)?;

    bastion_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = build_state(config).await?;
    let failed = check_connectivity(&state).await;
    if !failed.is_empty() {
        tracing::warn!(?failed, "Starting with unreachable backends");
    }
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
