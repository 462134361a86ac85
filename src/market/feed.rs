//! Price Feed Client
//!
//! Fetches and normalizes market snapshots and historical series from the
//! upstream feed. Stateless beyond the HTTP client; a fixed pacing delay
//! precedes every upstream call to respect its rate limits.

use crate::market::models::{AssetDetail, MarketChart, MarketSnapshot, PricePoint};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Upstream responses as data, dispatched once instead of branching on
/// status codes at every call site.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome<T> {
    /// Upstream answered with a usable payload.
    Success(T),
    /// Upstream said slow down (HTTP 429).
    RateLimited,
    /// Upstream answered but knows nothing about the requested asset.
    Empty,
    /// Transport failure, bad status, or unparseable body.
    Error(String),
}

/// Client for the CoinGecko-shaped market data feed.
pub struct PriceFeedClient {
    client: Client,
    base_url: String,
    pacing: Duration,
}

impl PriceFeedClient {
    pub fn new(base_url: Option<String>, pacing: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build price feed client")?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            pacing,
        })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Pacing is a scheduling policy of this client, not of the cache.
    async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> FeedOutcome<T> {
        self.pace().await;

        let resp = match self.client.get(self.url(path)).query(query).send().await {
            Ok(r) => r,
            Err(e) => return FeedOutcome::Error(format!("request failed: {e}")),
        };

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(path, "Upstream feed rate limit hit");
            return FeedOutcome::RateLimited;
        }
        if !resp.status().is_success() {
            return FeedOutcome::Error(format!("upstream status {}", resp.status()));
        }

        match resp.json::<T>().await {
            Ok(v) => FeedOutcome::Success(v),
            Err(e) => FeedOutcome::Error(format!("body parse failed: {e}")),
        }
    }

    /// Top markets by market cap, symbols uppercased.
    pub async fn list_markets(&self) -> FeedOutcome<Vec<MarketSnapshot>> {
        let query = [
            ("vs_currency", "usd"),
            ("order", "market_cap_desc"),
            ("per_page", "100"),
            ("page", "1"),
            ("sparkline", "false"),
        ];

        match self.get_json::<Vec<MarketSnapshot>>("/coins/markets", &query).await {
            FeedOutcome::Success(list) => {
                debug!(count = list.len(), "Fetched market list");
                FeedOutcome::Success(list.into_iter().map(MarketSnapshot::normalized).collect())
            }
            FeedOutcome::RateLimited => FeedOutcome::RateLimited,
            FeedOutcome::Empty => FeedOutcome::Empty,
            FeedOutcome::Error(e) => FeedOutcome::Error(e),
        }
    }

    /// Single asset snapshot. An empty upstream result means the asset id is
    /// unknown, which is distinct from transport failure.
    pub async fn get_market(&self, asset_id: &str) -> FeedOutcome<MarketSnapshot> {
        let query = [("vs_currency", "usd"), ("ids", asset_id)];

        match self.get_json::<Vec<MarketSnapshot>>("/coins/markets", &query).await {
            FeedOutcome::Success(list) => match list.into_iter().next() {
                Some(snapshot) => FeedOutcome::Success(snapshot.normalized()),
                None => FeedOutcome::Empty,
            },
            FeedOutcome::RateLimited => FeedOutcome::RateLimited,
            FeedOutcome::Empty => FeedOutcome::Empty,
            FeedOutcome::Error(e) => FeedOutcome::Error(e),
        }
    }

    /// Historical (timestamp, price) series for a lookback window in days.
    pub async fn get_history(&self, asset_id: &str, days: &str) -> FeedOutcome<Vec<PricePoint>> {
        let path = format!("/coins/{asset_id}/market_chart");
        let query = [("vs_currency", "usd"), ("days", days)];

        match self.get_json::<MarketChart>(&path, &query).await {
            FeedOutcome::Success(chart) => FeedOutcome::Success(chart.prices),
            FeedOutcome::RateLimited => FeedOutcome::RateLimited,
            FeedOutcome::Empty => FeedOutcome::Empty,
            FeedOutcome::Error(e) => FeedOutcome::Error(e),
        }
    }

    /// Snapshot plus chart. A history failure after a successful snapshot
    /// fetch degrades to an empty chart; callers tolerate a detail with no
    /// series rather than losing the whole request.
    pub async fn fetch_detail(&self, asset_id: &str, days: &str) -> FeedOutcome<AssetDetail> {
        let snapshot = match self.get_market(asset_id).await {
            FeedOutcome::Success(s) => s,
            FeedOutcome::RateLimited => return FeedOutcome::RateLimited,
            FeedOutcome::Empty => return FeedOutcome::Empty,
            FeedOutcome::Error(e) => return FeedOutcome::Error(e),
        };

        let chart = match self.get_history(asset_id, days).await {
            FeedOutcome::Success(points) => points,
            outcome => {
                let kind = outcome_kind(&outcome);
                warn!(asset_id, days, kind, "Chart fetch degraded to empty series");
                Vec::new()
            }
        };

        FeedOutcome::Success(AssetDetail {
            asset: snapshot,
            chart,
        })
    }
}

fn outcome_kind<T>(outcome: &FeedOutcome<T>) -> &'static str {
    match outcome {
        FeedOutcome::Success(_) => "success",
        FeedOutcome::RateLimited => "rate_limited",
        FeedOutcome::Empty => "empty",
        FeedOutcome::Error(_) => "error",
    }
}
