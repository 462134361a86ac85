//! Portfolio endpoints: trading, holdings, summary, and history.

use crate::api::error::ApiError;
use crate::auth::models::Claims;
use crate::portfolio::models::{
    PortfolioSummary, Position, TradeReceipt, TradeRequest, Transaction,
};
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use uuid::Uuid;

fn current_user_id(claims: &Claims) -> Result<Uuid, ApiError> {
    Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)
}

/// POST /api/portfolio/buy
pub async fn buy(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<TradeRequest>,
) -> Result<Json<TradeReceipt>, ApiError> {
    let user_id = current_user_id(&claims)?;
    let new_balance = state.ledger.buy(user_id, &request)?;

    Ok(Json(TradeReceipt {
        message: "Purchase successful".to_string(),
        new_balance,
    }))
}

/// POST /api/portfolio/sell
pub async fn sell(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<TradeRequest>,
) -> Result<Json<TradeReceipt>, ApiError> {
    let user_id = current_user_id(&claims)?;
    let new_balance = state.ledger.sell(user_id, &request)?;

    Ok(Json(TradeReceipt {
        message: "Sale successful".to_string(),
        new_balance,
    }))
}

/// GET /api/portfolio
pub async fn list_positions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let user_id = current_user_id(&claims)?;
    let positions = state.ledger.positions(user_id)?;
    Ok(Json(positions))
}

/// GET /api/portfolio/summary
pub async fn summarize_portfolio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let user_id = current_user_id(&claims)?;
    let summary = state.analytics.summarize(user_id).await?;
    Ok(Json(summary))
}

/// GET /api/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let user_id = current_user_id(&claims)?;
    let transactions = state.ledger.transactions(user_id)?;
    Ok(Json(transactions))
}
