//! Bearer authentication extractors.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use uuid::Uuid;

use cadence_core::{AuthMethod, AuthPrincipal};

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for optionally authenticated requests.
///
/// A missing, malformed, expired or revoked credential yields
/// [`AuthPrincipal::Anonymous`]; store failures while resolving one are errors.
#[derive(Debug, Clone)]
pub struct Auth {
    pub principal: AuthPrincipal,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let principal = match token {
            Some(token) => match state.authenticator.authenticate(token).await {
                Ok(principal) => principal,
                Err(e) if e.is_internal() => return Err(e.into()),
                Err(e) => {
                    tracing::debug!(subsystem = "api", component = "auth", reason = %e, "Bearer rejected");
                    AuthPrincipal::Anonymous
                }
            },
            None => AuthPrincipal::Anonymous,
        };

        Ok(Auth { principal })
    }
}

/// Extractor that requires an authenticated user.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub user_id: Uuid,
    pub username: String,
    pub method: AuthMethod,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = Auth::from_request_parts(parts, state).await?;

        match auth.principal {
            AuthPrincipal::User {
                user_id,
                username,
                method,
            } => Ok(RequireAuth {
                user_id,
                username,
                method,
            }),
            AuthPrincipal::Anonymous => Err(ApiError::Unauthorized(
                "Could not validate credentials".to_string(),
            )),
        }
    }
}
