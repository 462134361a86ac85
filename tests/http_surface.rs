//! HTTP surface tests over the assembled router: route layout, the JWT
//! gate, and the numeric wire shape of money fields.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use papertrade_backend::{
    api,
    auth::{AuthState, JwtHandler, UserStore},
    market::{MarketCache, PriceFeedClient},
    portfolio::{PortfolioAnalytics, PositionLedger},
    state::AppState,
    store::Db,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;

fn build_app() -> (Router, NamedTempFile) {
    let temp = NamedTempFile::new().unwrap();
    let db = Db::open(temp.path().to_str().unwrap()).unwrap();

    let user_store = Arc::new(UserStore::new(db.clone()));
    let ledger = Arc::new(PositionLedger::new(db));
    let jwt_handler = Arc::new(JwtHandler::new("test-secret".to_string()));
    let auth_state = AuthState::new(user_store, jwt_handler.clone());

    // Unroutable feed address: these tests never reach the upstream.
    let feed = Arc::new(
        PriceFeedClient::new(Some("http://127.0.0.1:1".to_string()), Duration::ZERO).unwrap(),
    );
    let market_cache = Arc::new(MarketCache::new());
    let detail_cache = Arc::new(MarketCache::new());
    let analytics = Arc::new(PortfolioAnalytics::new(
        ledger.clone(),
        market_cache.clone(),
        feed.clone(),
        Duration::from_secs(300),
    ));

    let app_state = AppState {
        ledger,
        analytics,
        market_cache,
        detail_cache,
        feed,
        cache_ttl: Duration::from_secs(300),
    };

    (api::router(app_state, auth_state, jwt_handler), temp)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _temp) = build_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_market_routes_live_under_api_cryptos() {
    let (app, _temp) = build_app();

    // Known routes answer with the auth gate, not a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/cryptos")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/cryptos/bitcoin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/assets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_buy_and_profile_report_numeric_balances() {
    let (app, _temp) = build_app();

    let register = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "email": "wire@example.com",
                "password": "password123",
                "name": "Wire"
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(register).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["user"]["balance"].is_number());
    assert_eq!(body["user"]["balance"], json!(10000.0));
    let token = body["access_token"].as_str().unwrap().to_string();

    let buy = Request::builder()
        .method("POST")
        .uri("/api/portfolio/buy")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(
            json!({
                "asset_id": "bitcoin",
                "asset_symbol": "BTC",
                "asset_name": "Bitcoin",
                "quantity": 0.001,
                "price_per_unit": 50000.0
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(buy).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["new_balance"].is_number());
    assert_eq!(body["new_balance"], json!(9950.0));

    let me = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(me).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["balance"], json!(9950.0));
}
