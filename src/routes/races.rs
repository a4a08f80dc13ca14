use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::helpers::is_safe_path_segment;
use crate::models::{sort_by_position, DataState, ResultItem, SessionType};
use crate::routes::calendar::ensure_loaded;
use crate::routes::AppState;
use crate::services::calendar::sorted_sessions;
use crate::services::sessions::{SessionEntry, SessionKind};

/// Positions highlighted as podium finishes.
const PODIUM_POSITIONS: [&str; 3] = ["1", "2", "3"];

/// Response type for one session of a race weekend.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub kind: SessionKind,
    /// Display label (e.g. "Practice 1", "Sprint Shootout")
    pub label: String,
    pub date: String,
    pub time: Option<String>,
    /// Parsed start; absent when the upstream date/time is unparseable
    pub start: Option<DateTime<Utc>>,
    /// More than two hours past the session start
    pub completed: bool,
    /// Results table to query for this session, if any
    pub results_type: Option<SessionType>,
}

impl SessionResponse {
    fn new(entry: &SessionEntry, now: DateTime<Utc>) -> Self {
        Self {
            kind: entry.kind,
            label: entry.label().to_string(),
            date: entry.date.clone(),
            time: entry.time.clone(),
            start: entry.start(),
            completed: entry.is_completed(now),
            results_type: entry.kind.results_type(),
        }
    }
}

/// Response type for GET /api/v1/races/:round/sessions.
#[derive(Debug, Serialize, ToSchema)]
pub struct RaceSessionsResponse {
    pub round: String,
    pub name: String,
    pub circuit_name: String,
    pub location: String,
    pub is_sprint_weekend: bool,
    /// Sessions in start order, unparseable ones last
    pub sessions: Vec<SessionResponse>,
}

/// One classified row of a results table.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultRow {
    pub position: String,
    pub driver_id: String,
    /// Three-letter code, falling back to the family name
    pub driver_code: String,
    pub driver_name: String,
    pub constructor: String,
    /// Finishing time or status for races; best lap reached for qualifying
    pub time_or_status: String,
    /// Absent for qualifying
    pub points: Option<String>,
    pub podium: bool,
}

impl From<&ResultItem> for ResultRow {
    fn from(item: &ResultItem) -> Self {
        let driver = item.driver();
        Self {
            position: item.position().to_string(),
            driver_id: driver.driver_id.clone(),
            driver_code: driver
                .code
                .clone()
                .unwrap_or_else(|| driver.family_name.to_uppercase()),
            driver_name: format!("{} {}", driver.given_name, driver.family_name),
            constructor: item.constructor().name.clone(),
            time_or_status: item.time_or_status().to_string(),
            points: item.points().map(str::to_string),
            podium: PODIUM_POSITIONS.contains(&item.position()),
        }
    }
}

/// Response type for GET /api/v1/races/:round/results/:session_type.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    pub season: i32,
    pub round: String,
    pub session_type: SessionType,
    /// "empty" until the upstream publishes the classification
    pub state: DataState,
    pub results: Vec<ResultRow>,
}

/// Get all sessions of a race weekend in start order.
#[utoipa::path(
    get,
    path = "/api/v1/races/{round}/sessions",
    tag = "Races",
    params(
        ("round" = String, Path, description = "Round identifier (e.g. \"24\")"),
    ),
    responses(
        (status = 200, description = "Sessions of the weekend", body = RaceSessionsResponse),
        (status = 404, description = "Round not in the calendar", body = ErrorResponse),
        (status = 502, description = "Calendar not loaded yet", body = ErrorResponse),
    )
)]
pub async fn get_race_sessions(
    State(state): State<AppState>,
    Path(round): Path<String>,
) -> Result<Json<RaceSessionsResponse>, AppError> {
    let calendar = state.calendar.read().await;
    ensure_loaded(&calendar)?;

    let race = calendar
        .find_race(&round)
        .ok_or_else(|| AppError::NotFound(format!("Round {} not found", round)))?;

    let now = state.clock.now();
    let sessions = sorted_sessions(race)
        .iter()
        .map(|entry| SessionResponse::new(entry, now))
        .collect();

    Ok(Json(RaceSessionsResponse {
        round: race.round.clone(),
        name: race.name.clone(),
        circuit_name: race.circuit_name.clone(),
        location: race.location.clone(),
        is_sprint_weekend: race.is_sprint_weekend(),
        sessions,
    }))
}

/// Get the classification of a race, qualifying or sprint session.
///
/// Fetched from upstream on every call, ordered by position.
#[utoipa::path(
    get,
    path = "/api/v1/races/{round}/results/{session_type}",
    tag = "Races",
    params(
        ("round" = String, Path, description = "Round identifier (e.g. \"24\")"),
        ("session_type" = String, Path, description = "RACE, QUALIFYING or SPRINT (case-insensitive)"),
    ),
    responses(
        (status = 200, description = "Session results", body = ResultsResponse),
        (status = 400, description = "Invalid round or session type", body = ErrorResponse),
        (status = 404, description = "Round not in the loaded calendar", body = ErrorResponse),
        (status = 502, description = "Upstream error", body = ErrorResponse),
    )
)]
pub async fn get_session_results(
    State(state): State<AppState>,
    Path((round, session_type)): Path<(String, String)>,
) -> Result<Json<ResultsResponse>, AppError> {
    if !is_safe_path_segment(&round) {
        return Err(AppError::BadRequest(format!("Invalid round '{}'", round)));
    }
    let session_type: SessionType = session_type.parse().map_err(AppError::BadRequest)?;

    {
        let calendar = state.calendar.read().await;
        if calendar.is_loaded() && calendar.find_race(&round).is_none() {
            return Err(AppError::NotFound(format!("Round {} not found", round)));
        }
    }

    let season = state.current_season().await;
    let mut items = state.client.fetch_results(season, &round, session_type).await?;
    sort_by_position(&mut items, ResultItem::position);

    let results: Vec<ResultRow> = items.iter().map(ResultRow::from).collect();
    Ok(Json(ResultsResponse {
        season,
        round,
        session_type,
        state: DataState::of(&results),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{empty_state, loaded_state};
    use crate::services::sessions::tests::{sprint_race, standard_race};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NO_UPSTREAM: &str = "http://127.0.0.1:9";

    fn result_json(position: &str, code: &str, time: Option<&str>, status: &str) -> serde_json::Value {
        let mut row = serde_json::json!({
            "position": position,
            "points": "10",
            "Driver": {
                "driverId": code.to_lowercase(),
                "givenName": "Given",
                "familyName": "Family",
                "code": code
            },
            "Constructor": { "constructorId": "ferrari", "name": "Ferrari" },
            "status": status
        });
        if let Some(time) = time {
            row["Time"] = serde_json::json!({ "time": time });
        }
        row
    }

    #[tokio::test]
    async fn test_sessions_sorted_with_completion() {
        let state = loaded_state("2025-05-03T19:00:00Z", vec![sprint_race()], NO_UPSTREAM);
        let Json(body) = get_race_sessions(State(state), Path("6".to_string()))
            .await
            .unwrap();

        assert!(body.is_sprint_weekend);
        let labels: Vec<&str> = body.sessions.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Practice 1", "Sprint Shootout", "Sprint", "Qualifying", "Race"]
        );
        let sprint = &body.sessions[2];
        assert_eq!(sprint.results_type, Some(SessionType::Sprint));
        assert!(sprint.completed);
        assert_eq!(body.sessions[1].results_type, None);
        assert!(!body.sessions[4].completed);
    }

    #[tokio::test]
    async fn test_sessions_unknown_round() {
        let state = loaded_state(
            "2025-12-01T00:00:00Z",
            vec![standard_race("Abu Dhabi Grand Prix", "2025-12-07", Some("13:00:00Z"))],
            NO_UPSTREAM,
        );
        let err = get_race_sessions(State(state), Path("99".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_results_sorted_with_podium() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "MRData": { "RaceTable": { "Races": [{
                "round": "24",
                "Results": [
                    result_json("3", "LEC", Some("+12.1"), "Finished"),
                    result_json("R", "ALB", None, "Collision"),
                    result_json("1", "VER", Some("1:26:07.469"), "Finished"),
                    result_json("2", "NOR", Some("+5.8"), "Finished"),
                    result_json("4", "PIA", None, "Lapped")
                ]
            }]}}
        });
        Mock::given(method("GET"))
            .and(path("/2025/24/results.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let state = loaded_state(
            "2025-12-08T00:00:00Z",
            vec![standard_race("Abu Dhabi Grand Prix", "2025-12-07", Some("13:00:00Z"))],
            &server.uri(),
        );
        let Json(resp) = get_session_results(
            State(state),
            Path(("24".to_string(), "race".to_string())),
        )
        .await
        .unwrap();

        assert_eq!(resp.state, DataState::Ready);
        assert_eq!(resp.session_type, SessionType::Race);
        let codes: Vec<&str> = resp.results.iter().map(|r| r.driver_code.as_str()).collect();
        assert_eq!(codes, vec!["VER", "NOR", "LEC", "PIA", "ALB"]);
        let podium: Vec<bool> = resp.results.iter().map(|r| r.podium).collect();
        assert_eq!(podium, vec![true, true, true, false, false]);
        assert_eq!(resp.results[3].time_or_status, "Lapped");
    }

    #[tokio::test]
    async fn test_results_not_published_yet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2025/24/qualifying.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "MRData": { "RaceTable": { "Races": [] } } }),
            ))
            .mount(&server)
            .await;

        let state = loaded_state(
            "2025-12-06T12:00:00Z",
            vec![standard_race("Abu Dhabi Grand Prix", "2025-12-07", Some("13:00:00Z"))],
            &server.uri(),
        );
        let Json(resp) = get_session_results(
            State(state),
            Path(("24".to_string(), "QUALIFYING".to_string())),
        )
        .await
        .unwrap();

        assert_eq!(resp.state, DataState::Empty);
        assert!(resp.results.is_empty());
    }

    #[tokio::test]
    async fn test_results_rejects_bad_input() {
        let state = empty_state("2025-12-01T00:00:00Z");

        let err = get_session_results(
            State(state.clone()),
            Path(("24".to_string(), "practice".to_string())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = get_session_results(
            State(state),
            Path(("..%2F24".to_string(), "race".to_string())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_results_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2025/24/sprint.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let state = loaded_state(
            "2025-12-08T00:00:00Z",
            vec![standard_race("Abu Dhabi Grand Prix", "2025-12-07", Some("13:00:00Z"))],
            &server.uri(),
        );
        let err = get_session_results(
            State(state),
            Path(("24".to_string(), "sprint".to_string())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }
}
