//! Reminder status HTTP endpoint.
//!
//! GET /api/v1/reminders returns the pending reminder jobs and the outcome
//! of the most recent scheduling pass.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::AppState;
use crate::services::jobs::PendingJobInfo;
use crate::services::reminders::ReminderPass;

#[derive(Debug, Serialize, ToSchema)]
pub struct RemindersResponse {
    /// Jobs waiting to fire, soonest first
    pub pending: Vec<PendingJobInfo>,
    /// Absent until the first calendar load
    pub last_pass: Option<ReminderPass>,
}

/// Get the current reminder schedule.
#[utoipa::path(
    get,
    path = "/api/v1/reminders",
    tag = "Reminders",
    responses(
        (status = 200, description = "Pending reminders and last scheduling pass", body = RemindersResponse),
    )
)]
pub async fn get_reminders(State(state): State<AppState>) -> Json<RemindersResponse> {
    let last_pass = state.calendar.read().await.last_pass.clone();
    Json(RemindersResponse {
        pending: state.jobs.pending(),
        last_pass,
    })
}
