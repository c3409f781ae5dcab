//! Task and dependency handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use cadence_cache::TaskSnapshot;
use cadence_core::CreateTaskRequest;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

/// `GET /tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<TaskSnapshot>>, ApiError> {
    Ok(Json(state.tasks.list(auth.user_id).await?))
}

/// `POST /tasks`
///
/// - 201 with the created task
/// - 400 for an empty title, an unknown interval, or an interval on a
///   non-recurring task
pub async fn create_task(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(request): JsonBody<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskSnapshot>), ApiError> {
    let task = state.tasks.create(auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks/:id`
pub async fn get_task(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskSnapshot>, ApiError> {
    Ok(Json(state.tasks.get(auth.user_id, task_id).await?))
}

/// `PUT /tasks/:id`: full replacement.
pub async fn update_task(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(task_id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateTaskRequest>,
) -> Result<Json<TaskSnapshot>, ApiError> {
    Ok(Json(
        state.tasks.update(auth.user_id, task_id, request).await?,
    ))
}

/// `DELETE /tasks/:id`
pub async fn delete_task(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(task_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.tasks.delete(auth.user_id, task_id).await?;
    Ok(Json(json!({ "detail": "Task deleted" })))
}

/// `GET /tasks/:id/dependencies`
pub async fn list_dependencies(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<TaskSnapshot>>, ApiError> {
    Ok(Json(
        state.graph.list_dependencies(auth.user_id, task_id).await?,
    ))
}

/// `POST /tasks/:id/dependencies/:dependent_id`
///
/// - 200 with the owning task
/// - 404 if either task is missing or not owned by the caller
/// - 409 if the edge already exists
pub async fn add_dependency(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((task_id, dependent_task_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TaskSnapshot>, ApiError> {
    Ok(Json(
        state
            .graph
            .add_edge(auth.user_id, task_id, dependent_task_id)
            .await?,
    ))
}

/// `DELETE /tasks/:id/dependencies/:dependent_id`
pub async fn remove_dependency(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((task_id, dependent_task_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TaskSnapshot>, ApiError> {
    Ok(Json(
        state
            .graph
            .remove_edge(auth.user_id, task_id, dependent_task_id)
            .await?,
    ))
}
