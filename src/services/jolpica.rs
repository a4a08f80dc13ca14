//! Jolpica F1 API client (Ergast-compatible).
//!
//! Fetches the season calendar, driver standings and session results.
//! See: https://github.com/jolpica/jolpica-f1/blob/main/docs/README.md

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::{
    Constructor, Driver, DriverStanding, QualifyingResult, Race, RaceResult, ResultItem,
    SessionSlot, SessionType,
};
use crate::services::refresher::CalendarSource;
use crate::services::timing::SessionTimestamp;

pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Upper bound for one upstream request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size; large enough for a full season, grid or classification.
const PAGE_LIMIT: u32 = 100;

/// Client for the Jolpica F1 API.
#[derive(Debug, Clone)]
pub struct JolpicaClient {
    client: reqwest::Client,
    base_url: String,
}

// --- Jolpica JSON response types ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MRData")]
    mr_data: T,
}

#[derive(Debug, Deserialize)]
struct RaceTableData<R> {
    #[serde(rename = "RaceTable")]
    race_table: RaceTable<R>,
}

#[derive(Debug, Deserialize)]
struct RaceTable<R> {
    #[serde(rename = "Races", default = "Vec::new")]
    races: Vec<R>,
}

#[derive(Debug, Deserialize)]
struct ApiRace {
    round: String,
    #[serde(rename = "raceName")]
    race_name: String,
    #[serde(rename = "Circuit")]
    circuit: ApiCircuit,
    date: String,
    time: Option<String>,
    #[serde(rename = "FirstPractice")]
    first_practice: Option<ApiSession>,
    #[serde(rename = "SecondPractice")]
    second_practice: Option<ApiSession>,
    #[serde(rename = "ThirdPractice")]
    third_practice: Option<ApiSession>,
    #[serde(rename = "Qualifying")]
    qualifying: Option<ApiSession>,
    // Published as "SprintShootout" in 2023.
    #[serde(rename = "SprintQualifying", alias = "SprintShootout")]
    sprint_qualifying: Option<ApiSession>,
    #[serde(rename = "Sprint")]
    sprint: Option<ApiSession>,
}

#[derive(Debug, Deserialize)]
struct ApiCircuit {
    #[serde(rename = "circuitName")]
    circuit_name: String,
    #[serde(rename = "Location")]
    location: ApiLocation,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    country: String,
}

#[derive(Debug, Deserialize)]
struct ApiSession {
    date: String,
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDriver {
    #[serde(rename = "driverId")]
    driver_id: String,
    #[serde(rename = "givenName")]
    given_name: String,
    #[serde(rename = "familyName")]
    family_name: String,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiConstructor {
    #[serde(rename = "constructorId")]
    constructor_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct StandingsData {
    #[serde(rename = "StandingsTable")]
    standings_table: StandingsTable,
}

#[derive(Debug, Deserialize)]
struct StandingsTable {
    #[serde(rename = "StandingsLists", default)]
    standings_lists: Vec<StandingsList>,
}

#[derive(Debug, Deserialize)]
struct StandingsList {
    #[serde(rename = "DriverStandings", default)]
    driver_standings: Vec<ApiDriverStanding>,
}

#[derive(Debug, Deserialize)]
struct ApiDriverStanding {
    // Missing for drivers excluded from the classification.
    #[serde(default)]
    position: Option<String>,
    #[serde(rename = "positionText", default)]
    position_text: Option<String>,
    points: String,
    wins: String,
    #[serde(rename = "Driver")]
    driver: ApiDriver,
    #[serde(rename = "Constructors", default)]
    constructors: Vec<ApiConstructor>,
}

#[derive(Debug, Deserialize)]
struct ApiResultRace {
    #[serde(rename = "Results", default)]
    results: Vec<ApiRaceResult>,
    #[serde(rename = "SprintResults", default)]
    sprint_results: Vec<ApiRaceResult>,
    #[serde(rename = "QualifyingResults", default)]
    qualifying_results: Vec<ApiQualifyingResult>,
}

#[derive(Debug, Deserialize)]
struct ApiRaceResult {
    position: String,
    points: Option<String>,
    #[serde(rename = "Driver")]
    driver: ApiDriver,
    #[serde(rename = "Constructor")]
    constructor: ApiConstructor,
    #[serde(rename = "Time")]
    time: Option<ApiTime>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ApiTime {
    time: String,
}

#[derive(Debug, Deserialize)]
struct ApiQualifyingResult {
    position: String,
    #[serde(rename = "Driver")]
    driver: ApiDriver,
    #[serde(rename = "Constructor")]
    constructor: ApiConstructor,
    #[serde(rename = "Q1")]
    q1: Option<String>,
    #[serde(rename = "Q2")]
    q2: Option<String>,
    #[serde(rename = "Q3")]
    q3: Option<String>,
}

// --- Conversions into domain types ---

impl From<ApiDriver> for Driver {
    fn from(d: ApiDriver) -> Self {
        Self {
            driver_id: d.driver_id,
            given_name: d.given_name,
            family_name: d.family_name,
            code: d.code,
        }
    }
}

impl From<ApiConstructor> for Constructor {
    fn from(c: ApiConstructor) -> Self {
        Self {
            constructor_id: c.constructor_id,
            name: c.name,
        }
    }
}

impl From<ApiSession> for SessionSlot {
    fn from(s: ApiSession) -> Self {
        Self {
            date: s.date,
            time: s.time,
        }
    }
}

impl From<ApiRaceResult> for RaceResult {
    fn from(r: ApiRaceResult) -> Self {
        Self {
            position: r.position,
            points: r.points,
            driver: r.driver.into(),
            constructor: r.constructor.into(),
            time: r.time.map(|t| t.time),
            status: r.status,
        }
    }
}

impl From<ApiQualifyingResult> for QualifyingResult {
    fn from(q: ApiQualifyingResult) -> Self {
        Self {
            position: q.position,
            driver: q.driver.into(),
            constructor: q.constructor.into(),
            q1: q.q1,
            q2: q.q2,
            q3: q.q3,
        }
    }
}

impl From<ApiDriverStanding> for DriverStanding {
    fn from(s: ApiDriverStanding) -> Self {
        Self {
            position: s.position.or(s.position_text).unwrap_or_else(|| "-".to_string()),
            points: s.points,
            wins: s.wins,
            driver: s.driver.into(),
            constructors: s.constructors.into_iter().map(Constructor::from).collect(),
        }
    }
}

/// Build a [`Race`], computing its start instant once. An unparseable start
/// falls back to `loaded_at`.
fn into_race(api: ApiRace, loaded_at: DateTime<Utc>) -> Race {
    let race_instant = match SessionTimestamp::parse(&api.date, api.time.as_deref()) {
        SessionTimestamp::Parsed(instant) => instant,
        SessionTimestamp::Invalid { raw } => {
            tracing::warn!(
                "Round {} ({}): unparseable race start '{}', using load time",
                api.round,
                api.race_name,
                raw
            );
            loaded_at
        }
    };

    Race {
        round: api.round,
        name: api.race_name,
        circuit_name: api.circuit.circuit_name,
        location: api.circuit.location.country,
        date: api.date,
        time: api.time,
        first_practice: api.first_practice.map(SessionSlot::from),
        second_practice: api.second_practice.map(SessionSlot::from),
        third_practice: api.third_practice.map(SessionSlot::from),
        qualifying: api.qualifying.map(SessionSlot::from),
        sprint_qualifying: api.sprint_qualifying.map(SessionSlot::from),
        sprint: api.sprint.map(SessionSlot::from),
        race_instant,
    }
}

impl JolpicaClient {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = format!("{}/{}?limit={}", self.base_url, path, PAGE_LIMIT);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Jolpica request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Jolpica returned HTTP {} for {}",
                response.status(),
                path
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Jolpica JSON parse error: {}", e))
        })
    }

    /// Season calendar in upstream order.
    pub async fn fetch_calendar(
        &self,
        season: i32,
        loaded_at: DateTime<Utc>,
    ) -> Result<Vec<Race>, AppError> {
        let envelope: Envelope<RaceTableData<ApiRace>> =
            self.get_json(&format!("{}.json", season)).await?;
        Ok(envelope
            .mr_data
            .race_table
            .races
            .into_iter()
            .map(|r| into_race(r, loaded_at))
            .collect())
    }

    /// Current driver standings; empty before the first race of the season.
    pub async fn fetch_driver_standings(&self, season: i32) -> Result<Vec<DriverStanding>, AppError> {
        let envelope: Envelope<StandingsData> = self
            .get_json(&format!("{}/driverStandings.json", season))
            .await?;
        Ok(envelope
            .mr_data
            .standings_table
            .standings_lists
            .into_iter()
            .next()
            .map(|list| {
                list.driver_standings
                    .into_iter()
                    .map(DriverStanding::from)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Results of one session; empty until the upstream publishes them.
    pub async fn fetch_results(
        &self,
        season: i32,
        round: &str,
        session_type: SessionType,
    ) -> Result<Vec<ResultItem>, AppError> {
        let path = format!("{}/{}/{}.json", season, round, session_type.endpoint());
        let envelope: Envelope<RaceTableData<ApiResultRace>> = self.get_json(&path).await?;

        let Some(race) = envelope.mr_data.race_table.races.into_iter().next() else {
            return Ok(Vec::new());
        };

        let items = match session_type {
            SessionType::Race => race
                .results
                .into_iter()
                .map(|r| ResultItem::Race(r.into()))
                .collect(),
            SessionType::Sprint => race
                .sprint_results
                .into_iter()
                .map(|r| ResultItem::Sprint(r.into()))
                .collect(),
            SessionType::Qualifying => race
                .qualifying_results
                .into_iter()
                .map(|q| ResultItem::Qualifying(q.into()))
                .collect(),
        };
        Ok(items)
    }
}

#[async_trait]
impl CalendarSource for JolpicaClient {
    async fn fetch_calendar(
        &self,
        season: i32,
        loaded_at: DateTime<Utc>,
    ) -> Result<Vec<Race>, AppError> {
        JolpicaClient::fetch_calendar(self, season, loaded_at).await
    }
}
