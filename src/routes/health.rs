use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" once a calendar is loaded, "degraded" before that)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether a season calendar has been loaded
    pub calendar_loaded: bool,
    /// Number of races in the loaded calendar
    pub races: usize,
    /// Successful calendar loads since startup
    pub calendar_loads: u64,
    /// Pending reminder jobs
    pub pending_reminders: usize,
    /// Error of the most recent failed calendar refresh, if any
    pub last_error: Option<String>,
}

/// Health check endpoint.
///
/// Always 200; status "degraded" means no calendar could be loaded yet, so
/// load balancers can distinguish partial failures.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let calendar = state.calendar.read().await;
    let loaded = calendar.is_loaded();

    Json(HealthResponse {
        status: if loaded { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        calendar_loaded: loaded,
        races: calendar.races.len(),
        calendar_loads: calendar.total_loads,
        pending_reminders: state.jobs.len(),
        last_error: calendar.last_error.clone(),
    })
}
