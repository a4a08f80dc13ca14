//! Chronological ordering of races and sessions, next-race selection and the
//! in-memory calendar shared between the refresher and the routes.

use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::Race;
use crate::services::reminders::ReminderPass;
use crate::services::sessions::{extract_sessions, SessionEntry};
use crate::services::timing::SessionTimestamp;

// ---------------------------------------------------------------------------
// Calendar state (in-memory, shared via Arc<RwLock<>>)
// ---------------------------------------------------------------------------

/// Latest calendar load plus the outcome of the last scheduling pass.
/// Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default)]
pub struct CalendarState {
    pub season: Option<i32>,
    pub races: Vec<Race>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub total_loads: u64,
    pub last_pass: Option<ReminderPass>,
}

impl CalendarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn find_race(&self, round: &str) -> Option<&Race> {
        self.races.iter().find(|r| r.round == round)
    }
}

/// Shared calendar handle.
pub type SharedCalendarState = Arc<RwLock<CalendarState>>;

/// Season to fetch: the configured one, else the current UTC year.
pub fn effective_season(configured: Option<i32>, now: DateTime<Utc>) -> i32 {
    configured.unwrap_or_else(|| now.year())
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Stable ascending sort by instant; equal keys keep input order.
pub fn sort_chronologically<T>(items: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(key);
}

/// Sessions of a weekend in start order, unparseable ones last.
pub fn sorted_sessions(race: &Race) -> Vec<SessionEntry> {
    let mut sessions = extract_sessions(race);
    for session in &sessions {
        if let SessionTimestamp::Invalid { raw } = &session.timestamp {
            tracing::warn!(
                "Round {} ({}): unparseable {} time '{}', sorting last",
                race.round,
                race.name,
                session.label(),
                raw
            );
        }
    }
    sort_chronologically(&mut sessions, |s| s.timestamp.sort_key());
    sessions
}

fn race_timestamp(race: &Race) -> SessionTimestamp {
    SessionTimestamp::parse(&race.date, race.time.as_deref())
}

/// Races in start order, unparseable ones last.
pub fn sort_races(races: &[Race]) -> Vec<&Race> {
    let mut sorted: Vec<&Race> = races.iter().collect();
    sort_chronologically(&mut sorted, |r| race_timestamp(r).sort_key());
    sorted
}

/// Earliest race starting strictly after `now`, or `None` once the season is
/// over. Races whose start cannot be parsed are never selected.
pub fn next_race(races: &[Race], now: DateTime<Utc>) -> Option<&Race> {
    sort_races(races)
        .into_iter()
        .find(|r| race_timestamp(r).instant().is_some_and(|start| start > now))
}
