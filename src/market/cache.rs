//! Market Data Cache
//!
//! TTL cache in front of the rate-limited upstream feed. Serves fresh data
//! within the TTL window and falls back to the last known payload when the
//! upstream signals rate limiting. A transient upstream error never falls
//! back: "upstream said slow down" and "upstream broke" are different
//! conditions.

use crate::market::feed::FeedOutcome;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Cache key for the global market-list entry.
pub const MARKET_LIST_KEY: &str = "market_list";

struct CacheEntry<T> {
    payload: T,
    fetched_at: Instant,
}

/// Shared TTL cache. Entries past their TTL stay in the map as stale
/// fallback values until a successful refresh replaces them.
pub struct MarketCache<T: Clone> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Feed degraded and no fallback data exists.
    UpstreamUnavailable,
    /// Feed failed for a reason other than rate limiting.
    UpstreamError(String),
    /// Asset id unknown to the feed.
    NotFound,
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::UpstreamUnavailable => {
                write!(f, "Market data temporarily unavailable")
            }
            CacheError::UpstreamError(reason) => write!(f, "Market data fetch failed: {reason}"),
            CacheError::NotFound => write!(f, "Asset not found"),
        }
    }
}

impl std::error::Error for CacheError {}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::UpstreamUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Market data temporarily unavailable. Please try again in a moment.".to_string(),
            ),
            CacheError::UpstreamError(_) => (
                StatusCode::BAD_GATEWAY,
                "Failed to fetch market data".to_string(),
            ),
            CacheError::NotFound => (StatusCode::NOT_FOUND, "Asset not found".to_string()),
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

impl<T: Clone> Default for MarketCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MarketCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh-or-fetch without a view filter.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FeedOutcome<T>>,
    {
        self.get_or_fetch_filtered(key, ttl, fetch, |payload| payload)
            .await
    }

    /// Fresh-or-fetch. The filter shapes the returned view only; the cached
    /// payload is never mutated. The lock is not held across the fetch, so
    /// callers racing on an expired key may fetch redundantly; the store
    /// itself is atomic under the write lock.
    pub async fn get_or_fetch_filtered<F, Fut, G>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
        filter: G,
    ) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FeedOutcome<T>>,
        G: FnOnce(T) -> T,
    {
        if let Some(fresh) = self.fresh(key, ttl) {
            debug!(key, "Cache hit");
            return Ok(filter(fresh));
        }

        match fetch().await {
            FeedOutcome::Success(payload) => {
                self.store(key, payload.clone());
                Ok(filter(payload))
            }
            FeedOutcome::RateLimited => match self.any(key) {
                Some(stale) => {
                    warn!(key, "Upstream rate limited, serving stale cache entry");
                    Ok(filter(stale))
                }
                None => Err(CacheError::UpstreamUnavailable),
            },
            FeedOutcome::Empty => Err(CacheError::NotFound),
            FeedOutcome::Error(reason) => Err(CacheError::UpstreamError(reason)),
        }
    }

    fn fresh(&self, key: &str, ttl: Duration) -> Option<T> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < ttl)
            .map(|entry| entry.payload.clone())
    }

    /// Any entry for the key, fresh or stale.
    fn any(&self, key: &str) -> Option<T> {
        let entries = self.entries.read();
        entries.get(key).map(|entry| entry.payload.clone())
    }

    fn store(&self, key: &str, payload: T) {
        let mut entries = self.entries.write();
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
            },
        );
    }
}
