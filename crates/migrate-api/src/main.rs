//! # Migrate API
//!
//! Entry point for the repository migration HTTP service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use migrate_api::config::ApiConfig;
use migrate_api::{create_router, AppState};
use migrate_engine::MigrationEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Repository migration service - moves git history and metadata between
/// GitHub, GitLab, and Bitbucket.
#[derive(Parser, Debug)]
#[command(name = "migrate-api")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file. Missing files fall back to
    /// defaults merged with environment variables.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured listen address.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Overrides the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) if path.exists() => ApiConfig::from_file(path)?,
        _ => ApiConfig::default(),
    };
    config.merge_env()?;
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    config.validate_config()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("migrate_api={0},migrate_engine={0}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting migrate-api");
    tracing::info!(addr = %config.addr, temp_dir = %config.temp_dir.display(), "configuration loaded");

    std::fs::create_dir_all(&config.temp_dir)?;

    let engine = Arc::new(MigrationEngine::new(config.temp_dir.clone()));
    let router = create_router(AppState { engine: engine.clone() });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down periodic jobs");
    engine.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("ctrl-c received, shutting down");
}
