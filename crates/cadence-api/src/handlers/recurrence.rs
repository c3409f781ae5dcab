//! Recurring task handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use cadence_cache::TaskSnapshot;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecurrenceChange {
    pub recurrence_interval: String,
}

/// `GET /recurring-tasks`
pub async fn list_recurring(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<TaskSnapshot>>, ApiError> {
    Ok(Json(state.tasks.list_recurring(auth.user_id).await?))
}

/// `GET /recurring-tasks/:id/recurrence`
pub async fn get_recurrence(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(task_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state.tasks.recurrence(auth.user_id, task_id).await?;
    Ok(Json(json!({ "task": task })))
}

/// `PUT /recurring-tasks/:id/recurrence`
///
/// - 404 if the task is missing, not owned, or not recurring
/// - 400 for an unknown interval name
pub async fn update_recurrence(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(task_id): Path<Uuid>,
    JsonBody(change): JsonBody<RecurrenceChange>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state
        .tasks
        .set_recurrence(auth.user_id, task_id, &change.recurrence_interval)
        .await?;
    Ok(Json(json!({
        "message": "Recurrence settings updated",
        "task": task,
    })))
}
