//! Authentication API Endpoints
//! Mission: Provide register, login, and profile endpoints

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, LoginRequest, RegisterRequest, TokenResponse, UserResponse},
    user_store::UserStore,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(user_store: Arc<UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
        }
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AuthApiError> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 3 {
        return Err(AuthApiError::InvalidEmail);
    }
    if payload.password.len() < 8 {
        return Err(AuthApiError::WeakPassword);
    }
    if payload.name.trim().is_empty() {
        return Err(AuthApiError::MissingName);
    }

    let existing = state
        .user_store
        .get_user_by_email(&email)
        .map_err(|_| AuthApiError::InternalError)?;
    if existing.is_some() {
        return Err(AuthApiError::EmailTaken);
    }

    let user = state
        .user_store
        .create_user(&email, payload.name.trim(), &payload.password)
        .map_err(|e| {
            warn!("Failed to create user: {}", e);
            AuthApiError::InternalError
        })?;

    let (token, expires_in) = state
        .jwt_handler
        .generate_token(&user)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("Registered user: {}", user.email);

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthApiError> {
    let email = payload.email.trim().to_lowercase();

    // Verify credentials
    let valid = state
        .user_store
        .verify_password(&email, &payload.password)
        .map_err(|_| AuthApiError::InternalError)?;

    if !valid {
        warn!("Failed login attempt: {}", email);
        return Err(AuthApiError::InvalidCredentials);
    }

    let user = state
        .user_store
        .get_user_by_email(&email)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::InvalidCredentials)?;

    let (token, expires_in) = state
        .jwt_handler
        .generate_token(&user)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("Login successful: {}", user.email);

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Current user profile - GET /api/auth/me
///
/// Hits the store so the balance reflects trades made after the token was
/// issued.
pub async fn me(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthApiError::Unauthorized)?;

    let user = state
        .user_store
        .get_user_by_id(&user_id)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    Unauthorized,
    InvalidEmail,
    WeakPassword,
    MissingName,
    EmailTaken,
    UserNotFound,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthApiError::InvalidEmail => (StatusCode::BAD_REQUEST, "Invalid email address"),
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters",
            ),
            AuthApiError::MissingName => (StatusCode::BAD_REQUEST, "Name is required"),
            AuthApiError::EmailTaken => (StatusCode::CONFLICT, "Email already registered"),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
