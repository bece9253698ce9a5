// src/config.rs
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub cdr_port: u16,
    /// Absent means run against the in-memory store (dev / tests).
    pub database_url: Option<String>,
    pub max_inflight_writes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        Ok(Config {
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "production".to_string()),
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            cdr_port: env::var("CDR_PORT")
                .unwrap_or_else(|_| "9000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL").ok(),
            max_inflight_writes: env::var("MAX_INFLIGHT_WRITES")
                .unwrap_or_else(|_| "64".to_string())
                .parse()?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.cdr_port)
    }
}
