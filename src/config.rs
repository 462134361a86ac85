//! Environment-driven configuration.
//!
//! Every tunable comes from the environment with a sensible default, so the
//! server starts with no configuration at all.

use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_path: String,
    pub jwt_secret: String,
    /// Override points at a stub server in tests.
    pub feed_base_url: Option<String>,
    /// Fixed delay before every upstream feed call.
    pub feed_pacing: Duration,
    /// Freshness window for cached market data.
    pub cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "papertrade.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using insecure default");
            "change-me-in-production".to_string()
        });

        let feed_base_url = env::var("FEED_BASE_URL").ok();

        let feed_pacing = env::var("FEED_PACING_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(500));

        let cache_ttl = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Self {
            bind_addr,
            database_path,
            jwt_secret,
            feed_base_url,
            feed_pacing,
            cache_ttl,
        }
    }
}
