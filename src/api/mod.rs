//! HTTP API Module
//! Mission: Thin request/response mapping over the market and portfolio cores

pub mod error;
pub mod market;
pub mod portfolio;

pub use error::ApiError;

use crate::auth::{api as auth_api, auth_middleware, AuthState, JwtHandler};
use crate::middleware::request_logging;
use crate::state::AppState;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Assemble the full HTTP surface: public auth and health routes, plus
/// portfolio and market routes behind the JWT gate.
pub fn router(app_state: AppState, auth_state: AuthState, jwt_handler: Arc<JwtHandler>) -> Router {
    // Public auth routes
    let auth_router = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .with_state(auth_state.clone());

    // Protected auth routes (profile)
    let profile_router = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route_layer(from_fn_with_state(jwt_handler.clone(), auth_middleware))
        .with_state(auth_state);

    // Protected trading and market routes
    let protected_routes = Router::new()
        .route("/api/cryptos", get(market::list_assets))
        .route("/api/cryptos/:id", get(market::get_asset_detail))
        .route("/api/portfolio/buy", post(portfolio::buy))
        .route("/api/portfolio/sell", post(portfolio::sell))
        .route("/api/portfolio", get(portfolio::list_positions))
        .route("/api/portfolio/summary", get(portfolio::summarize_portfolio))
        .route("/api/transactions", get(portfolio::list_transactions))
        .route_layer(from_fn_with_state(jwt_handler, auth_middleware))
        .with_state(app_state);

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(auth_router)
        .merge(profile_router)
        .merge(protected_routes)
        .layer(from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
