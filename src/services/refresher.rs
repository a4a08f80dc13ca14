//! Background calendar refresher.
//!
//! Keeps the in-memory calendar current and drives reminder scheduling:
//! - fetches the season calendar from a [`CalendarSource`]
//! - publishes it to the shared [`CalendarState`], replacing the previous load
//! - runs one reminder scheduling pass over the freshly loaded races
//!
//! A failed fetch keeps the previous calendar (and its reminders) untouched,
//! records the error and retries after the shorter retry interval.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::errors::AppError;
use crate::models::Race;
use crate::services::calendar::{effective_season, SharedCalendarState};
use crate::services::clock::SharedClock;
use crate::services::jobs::JobScheduler;
use crate::services::reminders::schedule_all;

/// Anything that can produce a season calendar.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Races of `season`; `loaded_at` is the fallback start for unparseable races.
    async fn fetch_calendar(&self, season: i32, loaded_at: DateTime<Utc>)
        -> Result<Vec<Race>, AppError>;
}

/// Refresh cadence.
#[derive(Debug, Clone, Copy)]
pub struct RefreshIntervals {
    /// Sleep after a successful load.
    pub refresh: Duration,
    /// Sleep after a failed load.
    pub retry: Duration,
}

/// Fetch, publish and schedule once. Returns whether the fetch succeeded.
pub async fn refresh_once(
    source: &dyn CalendarSource,
    clock: &SharedClock,
    scheduler: &dyn JobScheduler,
    state: &SharedCalendarState,
    configured_season: Option<i32>,
) -> bool {
    let now = clock.now();
    let season = effective_season(configured_season, now);

    let races = match source.fetch_calendar(season, now).await {
        Ok(races) => races,
        Err(e) => {
            tracing::error!("Refresher: failed to load {} calendar: {}", season, e);
            let mut s = state.write().await;
            s.last_error = Some(e.to_string());
            return false;
        }
    };

    tracing::info!("Refresher: loaded {} races for season {}", races.len(), season);

    // Scheduling reads the clock again so a slow fetch does not skew delays.
    let pass = schedule_all(&races, clock.now(), scheduler);

    let mut s = state.write().await;
    s.season = Some(season);
    s.races = races;
    s.loaded_at = Some(now);
    s.last_error = None;
    s.total_loads += 1;
    s.last_pass = Some(pass);
    true
}

/// Main refresher loop. Runs forever; spawn it as a background task.
pub async fn run_refresher<S>(
    source: S,
    clock: SharedClock,
    scheduler: impl JobScheduler,
    state: SharedCalendarState,
    configured_season: Option<i32>,
    intervals: RefreshIntervals,
) where
    S: CalendarSource,
{
    tracing::info!(
        "Calendar refresher started (refresh every {}s, retry after {}s)",
        intervals.refresh.as_secs(),
        intervals.retry.as_secs()
    );

    loop {
        let ok = refresh_once(&source, &clock, &scheduler, &state, configured_season).await;
        let sleep_for = if ok { intervals.refresh } else { intervals.retry };
        tracing::debug!("Refresher: next load in {}s", sleep_for.as_secs());
        tokio::time::sleep(sleep_for).await;
    }
}
