//! Notification handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use cadence_core::{defaults, Notification};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl NotificationQuery {
    /// Resolve defaults and reject out-of-range paging.
    pub fn page(&self) -> Result<(i64, i64), ApiError> {
        let limit = self.limit.unwrap_or(defaults::NOTIFICATION_PAGE_LIMIT);
        if !(1..=defaults::NOTIFICATION_PAGE_LIMIT_MAX).contains(&limit) {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                defaults::NOTIFICATION_PAGE_LIMIT_MAX
            )));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::BadRequest("offset must not be negative".into()));
        }
        Ok((limit, offset))
    }
}

/// `GET /notifications?limit&offset`: unread only, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let (limit, offset) = query.page()?;
    let notifications = state
        .db
        .notifications
        .list_unread(auth.user_id, limit, offset)
        .await?;
    info!(
        subsystem = "api",
        user_id = %auth.user_id,
        result_count = notifications.len(),
        "Fetched unread notifications"
    );
    Ok(Json(notifications))
}

/// `PUT /notifications/:id/mark-as-read`
pub async fn mark_as_read(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .db
        .notifications
        .mark_read(auth.user_id, notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".into()))?;
    Ok(Json(notification))
}

/// `PUT /notifications/mark-all-as-read`: 404 when nothing is unread.
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let flipped = state.db.notifications.mark_all_read(auth.user_id).await?;
    if flipped.is_empty() {
        warn!(subsystem = "api", user_id = %auth.user_id, "No unread notifications found");
        return Err(ApiError::NotFound("No unread notifications found".into()));
    }
    info!(
        subsystem = "api",
        user_id = %auth.user_id,
        result_count = flipped.len(),
        "Marked notifications as read"
    );
    Ok(Json(flipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(NotificationQuery::default().page().unwrap(), (10, 0));
    }

    #[test]
    fn test_page_bounds() {
        let q = |limit, offset| NotificationQuery {
            limit: Some(limit),
            offset: Some(offset),
        };
        assert_eq!(q(100, 5).page().unwrap(), (100, 5));
        assert!(q(0, 0).page().is_err());
        assert!(q(101, 0).page().is_err());
        assert!(q(10, -1).page().is_err());
    }
}
