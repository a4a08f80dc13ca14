//! Season calendar endpoints.
//!
//! GET /api/v1/calendar                  all races in start order
//! GET /api/v1/calendar/next             next race with countdown
//! GET /api/v1/calendar/next/countdown   countdown as Server-Sent Events, one per second

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::models::Race;
use crate::routes::AppState;
use crate::services::calendar::{next_race, sort_races, CalendarState};
use crate::services::timing::{is_completed, Countdown, SessionTimestamp};

/// Countdown stream cadence.
const COUNTDOWN_TICK_SECS: u64 = 1;

/// Race as listed in the calendar.
#[derive(Debug, Serialize, ToSchema)]
pub struct RaceSummary {
    /// Round identifier (e.g. "24"), used for sessions and results lookups
    pub round: String,
    /// Race name (e.g. "Abu Dhabi Grand Prix")
    pub name: String,
    pub circuit_name: String,
    /// Country
    pub location: String,
    pub date: String,
    pub time: Option<String>,
    /// Parsed race start; absent when the upstream date/time is unparseable
    pub start: Option<DateTime<Utc>>,
    pub is_sprint_weekend: bool,
    /// More than two hours past the race start
    pub completed: bool,
}

impl RaceSummary {
    pub fn new(race: &Race, now: DateTime<Utc>) -> Self {
        Self {
            round: race.round.clone(),
            name: race.name.clone(),
            circuit_name: race.circuit_name.clone(),
            location: race.location.clone(),
            date: race.date.clone(),
            time: race.time.clone(),
            start: SessionTimestamp::parse(&race.date, race.time.as_deref()).instant(),
            is_sprint_weekend: race.is_sprint_weekend(),
            completed: is_completed(&race.date, race.time.as_deref(), now),
        }
    }
}

/// Response for GET /api/v1/calendar.
#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarResponse {
    pub season: Option<i32>,
    /// When the calendar was last fetched from upstream
    pub loaded_at: Option<DateTime<Utc>>,
    pub races: Vec<RaceSummary>,
}

/// Response for GET /api/v1/calendar/next.
#[derive(Debug, Serialize, ToSchema)]
pub struct NextRaceResponse {
    /// True when no race of the season is still ahead
    pub season_over: bool,
    pub race: Option<RaceSummary>,
    pub countdown: Option<Countdown>,
    /// Countdown formatted as "{d}d {hh}:{mm}:{ss}"
    pub countdown_text: Option<String>,
}

/// One event of the countdown stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CountdownTick {
    pub season_over: bool,
    pub round: Option<String>,
    pub race_name: Option<String>,
    pub countdown: Option<Countdown>,
    pub countdown_text: Option<String>,
}

/// Fail with 502 until the refresher has loaded a calendar.
pub(crate) fn ensure_loaded(calendar: &CalendarState) -> Result<(), AppError> {
    if calendar.is_loaded() {
        return Ok(());
    }
    let reason = calendar
        .last_error
        .clone()
        .unwrap_or_else(|| "not fetched yet".to_string());
    Err(AppError::ExternalServiceError(format!(
        "Calendar unavailable: {}",
        reason
    )))
}

fn next_race_response(calendar: &CalendarState, now: DateTime<Utc>) -> NextRaceResponse {
    match next_race(&calendar.races, now) {
        Some(race) => {
            let countdown = Countdown::between(now, race.race_instant);
            NextRaceResponse {
                season_over: false,
                race: Some(RaceSummary::new(race, now)),
                countdown_text: Some(countdown.to_string()),
                countdown: Some(countdown),
            }
        }
        None => NextRaceResponse {
            season_over: true,
            race: None,
            countdown: None,
            countdown_text: None,
        },
    }
}

fn countdown_tick(calendar: &CalendarState, now: DateTime<Utc>) -> CountdownTick {
    match next_race(&calendar.races, now) {
        Some(race) => {
            let countdown = Countdown::between(now, race.race_instant);
            CountdownTick {
                season_over: false,
                round: Some(race.round.clone()),
                race_name: Some(race.name.clone()),
                countdown_text: Some(countdown.to_string()),
                countdown: Some(countdown),
            }
        }
        None => CountdownTick {
            season_over: true,
            round: None,
            race_name: None,
            countdown: None,
            countdown_text: None,
        },
    }
}

/// Ticks recomputed from the calendar and clock every second. The interval
/// lives inside the stream and is dropped with it.
fn countdown_ticks(state: AppState) -> impl Stream<Item = CountdownTick> {
    let ticker = tokio::time::interval(Duration::from_secs(COUNTDOWN_TICK_SECS));
    stream::unfold((state, ticker), |(state, mut ticker)| async move {
        ticker.tick().await;
        let tick = {
            let calendar = state.calendar.read().await;
            countdown_tick(&calendar, state.clock.now())
        };
        Some((tick, (state, ticker)))
    })
}

/// List the season's races in start order.
///
/// Races with an unparseable start are listed last.
#[utoipa::path(
    get,
    path = "/api/v1/calendar",
    tag = "Calendar",
    responses(
        (status = 200, description = "Season calendar", body = CalendarResponse),
        (status = 502, description = "Calendar not loaded yet", body = ErrorResponse),
    )
)]
pub async fn list_calendar(State(state): State<AppState>) -> Result<Json<CalendarResponse>, AppError> {
    let calendar = state.calendar.read().await;
    ensure_loaded(&calendar)?;

    let now = state.clock.now();
    let races = sort_races(&calendar.races)
        .into_iter()
        .map(|race| RaceSummary::new(race, now))
        .collect();

    Ok(Json(CalendarResponse {
        season: calendar.season,
        loaded_at: calendar.loaded_at,
        races,
    }))
}

/// Get the next race and the time left until it starts.
#[utoipa::path(
    get,
    path = "/api/v1/calendar/next",
    tag = "Calendar",
    responses(
        (status = 200, description = "Next race, or season_over", body = NextRaceResponse),
        (status = 502, description = "Calendar not loaded yet", body = ErrorResponse),
    )
)]
pub async fn get_next_race(State(state): State<AppState>) -> Result<Json<NextRaceResponse>, AppError> {
    let calendar = state.calendar.read().await;
    ensure_loaded(&calendar)?;
    Ok(Json(next_race_response(&calendar, state.clock.now())))
}

/// Stream the next-race countdown, one `countdown` event per second.
#[utoipa::path(
    get,
    path = "/api/v1/calendar/next/countdown",
    tag = "Calendar",
    responses(
        (status = 200, description = "Server-Sent Events stream of countdown ticks",
            content_type = "text/event-stream", body = CountdownTick),
    )
)]
pub async fn stream_countdown(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = countdown_ticks(state)
        .map(|tick| Event::default().event("countdown").json_data(tick));
    Sse::new(events).keep_alive(KeepAlive::default())
}
