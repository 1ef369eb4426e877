//! annex - connectivity self-check for the document mirror
//!
//! Resolves configuration, attempts one supervised connection, ensures
//! the declared indexes, reports the resulting state, and shuts down
//! cleanly. Exits 0 even when the mirror is unreachable: degraded
//! operation is the contract, not a failure.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use annex::{Args, MongoSupervisor, SyncService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("annex={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  annex - clinic records mirror");
    info!("======================================");
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Database: {}", args.mongodb_db);
    info!(
        "Server selection timeout: {}ms",
        args.server_selection_timeout_ms
    );
    info!("======================================");

    let supervisor = Arc::new(MongoSupervisor::new(args.mongo_settings()));
    let service = SyncService::new(supervisor.clone());

    if supervisor.connect().await {
        if service.ensure_indexes().await {
            info!("Mirror indexes ensured");
        }
        info!("Mirror reachable; state: {:?}", supervisor.state().await);
    } else {
        warn!("Mirror unreachable; callers will run degraded until it returns");
    }

    supervisor.shutdown().await;
    Ok(())
}
