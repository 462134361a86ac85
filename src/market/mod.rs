//! Market Data Module
//! Mission: Upstream price feed access behind a TTL cache with degraded-mode
//! fallbacks

pub mod cache;
pub mod feed;
pub mod models;

pub use cache::{CacheError, MarketCache, MARKET_LIST_KEY};
pub use feed::{FeedOutcome, PriceFeedClient};
pub use models::{AssetDetail, MarketSnapshot, PricePoint};
