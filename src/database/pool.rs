// src/database/pool.rs
use deadpool_postgres::{Config, CreatePoolError, ManagerConfig, Pool, RecyclingMethod, Runtime};
use thiserror::Error;
use tokio_postgres::NoTls;
use tracing::info;

pub type DbPool = Pool;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("invalid database configuration: {0}")]
    Config(#[from] CreatePoolError),

    #[error("database connection test failed: {0}")]
    Connect(String),
}

/// Builds the shared connection pool and proves it can reach the
/// database before the CDR listener comes up.
pub async fn create_pool(database_url: &str) -> Result<Pool, DatabaseError> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

    let client = pool
        .get()
        .await
        .map_err(|e| DatabaseError::Connect(e.to_string()))?;
    client
        .simple_query("SELECT 1")
        .await
        .map_err(|e| DatabaseError::Connect(e.to_string()))?;

    info!("✅ CDR database reachable");

    Ok(pool)
}
