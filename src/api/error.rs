//! API error type for the trading and portfolio endpoints.

use crate::portfolio::LedgerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    InsufficientBalance,
    InsufficientHoldings,
    Unauthorized,
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(msg) => ApiError::Validation(msg),
            LedgerError::InsufficientBalance => ApiError::InsufficientBalance,
            LedgerError::InsufficientHoldings => ApiError::InsufficientHoldings,
            LedgerError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InsufficientBalance => {
                (StatusCode::BAD_REQUEST, "Insufficient balance".to_string())
            }
            ApiError::InsufficientHoldings => {
                (StatusCode::BAD_REQUEST, "Insufficient holdings".to_string())
            }
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal API error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
