use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{self, TokenKind};
use crate::database::{self, models::user, models::user::UserSummary};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// POST /login - exchange credentials for a token pair and a user summary.
///
/// Unknown username and wrong password produce the same 401 body.
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
    let pool = database::pool().await?;

    let user = user::find_by_username(&pool, &payload.username)
        .await?
        .filter(|u| auth::verify_password(&payload.password, &u.password_hash))
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let access = auth::issue_token(user.id, &user.username, TokenKind::Access)?;
    let refresh = auth::issue_token(user.id, &user.username, TokenKind::Refresh)?;

    tracing::info!(username = %user.username, "login succeeded");

    Ok(Json(LoginResponse {
        access,
        refresh,
        user: user.into(),
    }))
}

/// POST /login/refresh - exchange a valid refresh token for a new access token
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> Result<Json<RefreshResponse>, ApiError> {
    let claims = auth::verify_token(&payload.refresh, TokenKind::Refresh)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let access = auth::issue_token(claims.sub, &claims.username, TokenKind::Access)?;
    Ok(Json(RefreshResponse { access }))
}
