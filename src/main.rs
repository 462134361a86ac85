//! Papertrade - Simulated crypto trading backend
//!
//! Holds a simulated cash balance per account, fills buys and sells at
//! caller-supplied prices, and serves market data through a TTL cache in
//! front of a rate-limited upstream feed.

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use papertrade_backend::{
    api,
    auth::{AuthState, JwtHandler, UserStore},
    config::Config,
    market::{MarketCache, PriceFeedClient},
    portfolio::{PortfolioAnalytics, PositionLedger},
    state::AppState,
    store::Db,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let config = Config::from_env();
    info!("Starting papertrade backend on {}", config.bind_addr);

    // Storage
    let db = Db::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path))?;
    let user_store = Arc::new(UserStore::new(db.clone()));
    let ledger = Arc::new(PositionLedger::new(db));

    // Auth
    let jwt_handler = Arc::new(JwtHandler::new(config.jwt_secret.clone()));
    let auth_state = AuthState::new(user_store, jwt_handler.clone());

    // Market data: feed client behind TTL caches
    let feed = Arc::new(
        PriceFeedClient::new(config.feed_base_url.clone(), config.feed_pacing)
            .context("Failed to build price feed client")?,
    );
    let market_cache = Arc::new(MarketCache::new());
    let detail_cache = Arc::new(MarketCache::new());

    let analytics = Arc::new(PortfolioAnalytics::new(
        ledger.clone(),
        market_cache.clone(),
        feed.clone(),
        config.cache_ttl,
    ));

    let app_state = AppState {
        ledger,
        analytics,
        market_cache,
        detail_cache,
        feed,
        cache_ttl: config.cache_ttl,
    };

    let app = api::router(app_state, auth_state, jwt_handler);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "papertrade_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
