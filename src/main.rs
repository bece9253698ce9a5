// src/main.rs
use std::sync::Arc;

use tracing::{info, warn};

use cdr_ingest_engine::cdr::{CdrRecorder, CdrServer};
use cdr_ingest_engine::config::Config;
use cdr_ingest_engine::database::create_pool;
use cdr_ingest_engine::store::{CallStore, MemoryCallStore, PostgresCallStore};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("🚀 Starting CDR Ingest Engine");

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    info!("Environment: {}", config.environment);

    // Pick the store: Postgres when configured, in-memory otherwise
    let store: Arc<dyn CallStore> = match &config.database_url {
        Some(url) => {
            let db_pool = create_pool(url)
                .await
                .expect("Failed to create database pool");
            info!("✅ Database pool created");
            Arc::new(PostgresCallStore::new(db_pool))
        }
        None => {
            warn!("⚠️  DATABASE_URL not set, CDRs will be stored in memory only");
            Arc::new(MemoryCallStore::new())
        }
    };

    let recorder = Arc::new(CdrRecorder::new(store));

    // Failing to bind the CDR port is the one fatal startup error
    let server = CdrServer::bind(
        &config.bind_address(),
        recorder,
        config.max_inflight_writes,
    )
    .await
    .expect("Failed to bind CDR listener");

    let handle = server.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    handle.shutdown().await;
    info!("CDR server stopped");

    Ok(())
}
