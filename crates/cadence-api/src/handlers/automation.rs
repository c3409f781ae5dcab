//! Manual job triggers.
//!
//! Both endpoints only enqueue; the worker runs the job later and the
//! response never reflects its outcome.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use cadence_core::JobType;
use cadence_jobs::enqueue;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: &'static str,
    pub job_id: Uuid,
}

async fn trigger(
    state: &AppState,
    auth: &RequireAuth,
    job_type: JobType,
    message: &'static str,
) -> Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    let job_id = enqueue(state.db.jobs.as_ref(), job_type).await?;
    info!(
        subsystem = "api",
        component = "automation",
        user_id = %auth.user_id,
        %job_id,
        ?job_type,
        "Job triggered"
    );
    Ok((StatusCode::ACCEPTED, Json(TriggerResponse { message, job_id })))
}

/// `POST /automation/reminders`
pub async fn run_reminders(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    trigger(&state, &auth, JobType::ReminderScan, "Reminder task triggered.").await
}

/// `POST /automation/run-recurring`
pub async fn run_recurring(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    trigger(
        &state,
        &auth,
        JobType::RecurrenceExpansion,
        "Recurring tasks creation triggered.",
    )
    .await
}
