//! Account, token and API key handlers.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use cadence_auth::{AccessToken, RegisterRequest, TokenPair};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub username: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `POST /auth/register`
///
/// - 201 with the account summary
/// - 409 if the username (checked first) or email is taken
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let user = state.credentials.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            username: user.username,
            email: user.email,
            message: "Registered successfully".to_string(),
            created_at: user.created_at,
        }),
    ))
}

/// `POST /auth/user/login`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state
        .credentials
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(pair))
}

/// `POST /auth/user/refresh-token`
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    Ok(Json(state.credentials.refresh(&request.refresh_token).await?))
}

/// `GET /auth/protected-route`
pub async fn protected_route(auth: RequireAuth) -> Json<serde_json::Value> {
    Json(json!({
        "detail": format!(
            "Hello, {}! You have access to this protected route.",
            auth.username
        )
    }))
}

/// `DELETE /auth/account`: removes the caller, their tasks, edges and notifications.
pub async fn delete_account(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.tasks.delete_account(auth.user_id).await?;
    info!(subsystem = "api", user_id = %auth.user_id, "Account deleted");
    Ok(Json(json!({
        "detail": format!("Deleted account of '{}' successfully", auth.username)
    })))
}

/// `POST /api-key/regenerate`: the plaintext key is only ever shown here.
pub async fn regenerate_api_key(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<serde_json::Value>, ApiError> {
    let api_key = state.credentials.regenerate_api_key(auth.user_id).await?;
    Ok(Json(json!({
        "detail": "API key regenerated successfully",
        "api_key": api_key,
    })))
}

/// `POST /api-key/revoke`
pub async fn revoke_api_key(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.credentials.revoke_api_key(auth.user_id).await?;
    Ok(Json(json!({ "detail": "API key revoked successfully" })))
}
