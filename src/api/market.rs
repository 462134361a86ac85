//! Market data endpoints: asset listing and per-asset detail.

use crate::market::{AssetDetail, CacheError, MarketSnapshot, MARKET_LIST_KEY};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AssetListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssetDetailQuery {
    /// Lookback window in days for the chart; upstream also accepts "max".
    pub days: Option<String>,
}

/// GET /api/cryptos?search=
///
/// Cached market list. The search filter is applied to the returned view
/// only; the cached payload stays complete.
pub async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<AssetListQuery>,
) -> Result<Json<Vec<MarketSnapshot>>, CacheError> {
    let search = query
        .search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let assets = state
        .market_cache
        .get_or_fetch_filtered(
            MARKET_LIST_KEY,
            state.cache_ttl,
            || state.feed.list_markets(),
            move |list| match &search {
                Some(needle) => list
                    .into_iter()
                    .filter(|asset| asset.matches_search(needle))
                    .collect(),
                None => list,
            },
        )
        .await?;

    Ok(Json(assets))
}

/// GET /api/cryptos/:id?days=
///
/// Cached snapshot plus chart. The cache key includes the lookback window,
/// so different ranges for the same asset are independent entries.
pub async fn get_asset_detail(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    Query(query): Query<AssetDetailQuery>,
) -> Result<Json<AssetDetail>, CacheError> {
    let days = query.days.unwrap_or_else(|| "7".to_string());
    let cache_key = format!("asset_detail:{asset_id}:{days}");

    let detail = state
        .detail_cache
        .get_or_fetch(&cache_key, state.cache_ttl, || {
            state.feed.fetch_detail(&asset_id, &days)
        })
        .await?;

    Ok(Json(detail))
}
