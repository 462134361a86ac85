//! Shared application state, injected into every handler.
//!
//! The cache and stores are lifecycle-scoped instances built once at startup;
//! there are no process-wide singletons.

use crate::market::{AssetDetail, MarketCache, MarketSnapshot, PriceFeedClient};
use crate::portfolio::{PortfolioAnalytics, PositionLedger};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<PositionLedger>,
    pub analytics: Arc<PortfolioAnalytics>,
    pub market_cache: Arc<MarketCache<Vec<MarketSnapshot>>>,
    pub detail_cache: Arc<MarketCache<AssetDetail>>,
    pub feed: Arc<PriceFeedClient>,
    pub cache_ttl: Duration,
}
