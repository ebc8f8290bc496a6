//! Register, login, refresh, and logout endpoints.

use super::{AppState, RequireAuth};
use crate::error::{ApiError, ApiResult};
use axum::{Json, extract::State, http::StatusCode};
use listkeeper_auth::{LoginRequest, TokenPair, password};
use listkeeper_core::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Body of `POST /api/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Response of `POST /api/auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
}

/// Body of `POST /api/auth/refresh`.
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub user_id: UserId,
    pub refresh_token: String,
}

/// Body of `POST /api/auth/logout`.
#[derive(Deserialize)]
pub struct LogoutRequest {
    pub user_id: UserId,
    pub access_token: String,
}

/// Response of `POST /api/auth/logout`.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Registers a new user.
#[instrument(skip_all, fields(username = %request.username))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredUser>)> {
    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let hash = password::hash_password(&request.password)?;
    let user = state
        .issuer
        .store()
        .users()
        .create(
            username,
            &hash,
            request.first_name.trim(),
            request.last_name.trim(),
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                warn!("registration rejected: username taken");
                ApiError::Conflict {
                    message: "username is already taken".to_string(),
                }
            }
            other => other.into(),
        })?;

    info!(user_id = %user.id(), "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id(),
            username: user.username().to_string(),
        }),
    ))
}

/// Exchanges a username and password for a token pair.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    state
        .issuer
        .login(&request)
        .await?
        .map(Json)
        .ok_or(ApiError::AuthFailed)
}

/// Exchanges a refresh token for a new token pair.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    state
        .issuer
        .refresh_tokens(request.user_id, &request.refresh_token)
        .await?
        .map(Json)
        .ok_or(ApiError::AuthFailed)
}

/// Removes the caller's stored access token.
///
/// A body naming another user is answered with `success: false`.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Json(request): Json<LogoutRequest>,
) -> ApiResult<Json<LogoutResponse>> {
    if request.user_id != session.user_id() {
        warn!(user_id = %session.user_id(), "logout for another user refused");
        return Ok(Json(LogoutResponse { success: false }));
    }
    let success = state
        .issuer
        .logout(request.user_id, &request.access_token)
        .await?;
    Ok(Json(LogoutResponse { success }))
}
