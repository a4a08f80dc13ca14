//! Driver standings endpoint.
//!
//! GET /api/v1/standings/drivers fetches the current season standings from
//! upstream on every call.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::models::{sort_by_position, DataState, DriverStanding};
use crate::routes::AppState;

/// Response type for GET /api/v1/standings/drivers.
#[derive(Debug, Serialize, ToSchema)]
pub struct StandingsResponse {
    pub season: i32,
    /// "empty" before the first race of the season
    pub state: DataState,
    pub standings: Vec<DriverStanding>,
}

/// Get the driver championship standings.
#[utoipa::path(
    get,
    path = "/api/v1/standings/drivers",
    tag = "Standings",
    responses(
        (status = 200, description = "Driver standings", body = StandingsResponse),
        (status = 502, description = "Upstream error", body = ErrorResponse),
    )
)]
pub async fn get_driver_standings(
    State(state): State<AppState>,
) -> Result<Json<StandingsResponse>, AppError> {
    let season = state.current_season().await;
    let mut standings = state.client.fetch_driver_standings(season).await?;
    sort_by_position(&mut standings, |s| s.position.as_str());

    Ok(Json(StandingsResponse {
        season,
        state: DataState::of(&standings),
        standings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::loaded_state;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn standing_json(position: &str, code: &str, points: &str) -> serde_json::Value {
        serde_json::json!({
            "position": position,
            "points": points,
            "wins": "0",
            "Driver": {
                "driverId": code.to_lowercase(),
                "givenName": "Given",
                "familyName": "Family",
                "code": code
            },
            "Constructors": [{ "constructorId": "williams", "name": "Williams" }]
        })
    }

    #[tokio::test]
    async fn test_standings_sorted_by_position() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "MRData": { "StandingsTable": { "StandingsLists": [{
                "DriverStandings": [
                    standing_json("2", "VER", "396"),
                    standing_json("1", "NOR", "423"),
                    standing_json("3", "PIA", "410")
                ]
            }]}}
        });
        Mock::given(method("GET"))
            .and(path("/2025/driverStandings.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let state = loaded_state("2025-12-08T00:00:00Z", Vec::new(), &server.uri());
        let Json(resp) = get_driver_standings(State(state)).await.unwrap();

        assert_eq!(resp.season, 2025);
        assert_eq!(resp.state, DataState::Ready);
        let codes: Vec<Option<&str>> = resp
            .standings
            .iter()
            .map(|s| s.driver.code.as_deref())
            .collect();
        assert_eq!(codes, vec![Some("NOR"), Some("VER"), Some("PIA")]);
    }

    #[tokio::test]
    async fn test_standings_empty_before_first_race() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2025/driverStandings.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "MRData": { "StandingsTable": { "StandingsLists": [] } } }),
            ))
            .mount(&server)
            .await;

        let state = loaded_state("2025-02-01T00:00:00Z", Vec::new(), &server.uri());
        let Json(resp) = get_driver_standings(State(state)).await.unwrap();

        assert_eq!(resp.state, DataState::Empty);
        assert!(resp.standings.is_empty());
    }
}
