//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{AuthState, models::UserInfo, validation};

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for user login
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Login and logout routes, ready to be merged into another router
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

/// Create the router for the standalone authentication service
pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_router(state))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "auth-service".to_string(),
    })
}

/// User login endpoint
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    validation::validate_login(&payload.username, &payload.password)
        .map_err(AuthError::BadRequest)?;

    let username = payload.username.trim();
    info!("Login attempt for user: {}", username);

    if !state.rate_limiter.is_allowed(username).await {
        warn!("Too many login attempts for user: {}", username);
        return Err(AuthError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_username(username)
        .await
        .map_err(|e| {
            error!("Failed to look up user {}: {}", username, e);
            AuthError::InternalServerError
        })?
        .ok_or_else(|| {
            warn!("Login failed, unknown user: {}", username);
            AuthError::Unauthorized
        })?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.password)
        .await
        .map_err(|e| {
            error!("Failed to verify password for {}: {}", username, e);
            AuthError::InternalServerError
        })?;

    if !valid {
        warn!("Login failed, wrong password for user: {}", username);
        return Err(AuthError::Unauthorized);
    }

    state.rate_limiter.reset(username).await;

    let token = state
        .jwt_service
        .generate_token(user.id, &user.username, user.role.as_str())
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        user: UserInfo::from(&user),
    }))
}

/// Logout endpoint. Tokens are stateless, so the client simply discards its token.
pub async fn logout(
    State(state): State<AuthState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Json<MessageResponse> {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        if let Ok(claims) = state.jwt_service.validate_token(bearer.token()) {
            info!("User {} logged out", claims.username);
        }
    }

    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// Custom error type for authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid username or password")]
    Unauthorized,
    #[error("Too many login attempts, try again later")]
    TooManyRequests,
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
