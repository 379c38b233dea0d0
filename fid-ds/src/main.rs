//! Dispatch Service (fid-ds) - Main entry point
//!
//! HTTP service exposing inspector search and the mobilization workflow.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fid_common::clock::SystemClock;
use fid_ds::api::{create_router, AppContext};
use fid_ds::cache::InMemorySearchCache;
use fid_ds::config::Config;
use fid_ds::db;
use fid_ds::search::DirectoryService;

/// Command-line arguments for fid-ds
#[derive(Parser, Debug)]
#[command(name = "fid-ds")]
#[command(about = "Field inspector dispatch service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5810", env = "FID_DS_PORT")]
    port: u16,

    /// Directory holding the dispatch database
    #[arg(short, long, env = "FID_DATA_DIR")]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fid_ds=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_dir = fid_common::config::resolve_data_dir(args.data_dir.as_deref(), "FID_DATA_DIR")
        .context("Failed to resolve data directory")?;
    let config = Config::new(args.port, data_dir);

    info!("Starting dispatch service on port {}", config.port);
    info!("Data directory: {}", config.data_dir.display());

    let pool = db::init_database(&config.database_path())
        .await
        .context("Failed to initialize database")?;

    let clock = Arc::new(SystemClock);
    let cache = Arc::new(InMemorySearchCache::new(config.cache.clone()));
    let directory = Arc::new(
        DirectoryService::new(pool.clone(), cache, clock.clone())
            .with_fetch_timeout(config.search_fetch_timeout),
    );

    let ctx = AppContext {
        pool,
        clock,
        directory,
        port: config.port,
    };
    let router = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listen address")?;
    info!("Listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Dispatch service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install ctrl-c handler");
    }
    info!("Shutdown signal received");
}
