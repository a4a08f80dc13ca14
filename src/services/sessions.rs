//! Expansion of a race weekend into its individual sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Race, SessionSlot, SessionType};
use crate::services::timing::{is_completed, SessionTimestamp};

/// Kind of session within a race weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    FirstPractice,
    SecondPractice,
    ThirdPractice,
    SprintQualifying,
    Sprint,
    Qualifying,
    Race,
}

impl SessionKind {
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::FirstPractice => "Practice 1",
            SessionKind::SecondPractice => "Practice 2",
            SessionKind::ThirdPractice => "Practice 3",
            SessionKind::SprintQualifying => "Sprint Shootout",
            SessionKind::Sprint => "Sprint",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::Race => "Race",
        }
    }

    /// Results table for this session, if the upstream publishes one.
    /// Practice and shootout sessions have none.
    pub fn results_type(self) -> Option<SessionType> {
        match self {
            SessionKind::Race => Some(SessionType::Race),
            SessionKind::Qualifying => Some(SessionType::Qualifying),
            SessionKind::Sprint => Some(SessionType::Sprint),
            SessionKind::FirstPractice
            | SessionKind::SecondPractice
            | SessionKind::ThirdPractice
            | SessionKind::SprintQualifying => None,
        }
    }
}

const STANDARD_WEEKEND: [SessionKind; 4] = [
    SessionKind::FirstPractice,
    SessionKind::SecondPractice,
    SessionKind::ThirdPractice,
    SessionKind::Qualifying,
];

const SPRINT_WEEKEND: [SessionKind; 6] = [
    SessionKind::FirstPractice,
    SessionKind::SecondPractice,
    SessionKind::ThirdPractice,
    SessionKind::SprintQualifying,
    SessionKind::Sprint,
    SessionKind::Qualifying,
];

/// One present session of a weekend with its parsed start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub kind: SessionKind,
    pub date: String,
    pub time: Option<String>,
    pub timestamp: SessionTimestamp,
}

impl SessionEntry {
    fn new(kind: SessionKind, slot: &SessionSlot) -> Self {
        Self {
            kind,
            date: slot.date.clone(),
            time: slot.time.clone(),
            timestamp: SessionTimestamp::parse(&slot.date, slot.time.as_deref()),
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timestamp.instant()
    }

    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        is_completed(&self.date, self.time.as_deref(), now)
    }
}

fn slot_for(race: &Race, kind: SessionKind) -> Option<&SessionSlot> {
    match kind {
        SessionKind::FirstPractice => race.first_practice.as_ref(),
        SessionKind::SecondPractice => race.second_practice.as_ref(),
        SessionKind::ThirdPractice => race.third_practice.as_ref(),
        SessionKind::SprintQualifying => race.sprint_qualifying.as_ref(),
        SessionKind::Sprint => race.sprint.as_ref(),
        SessionKind::Qualifying => race.qualifying.as_ref(),
        SessionKind::Race => None,
    }
}

/// Present sessions of a weekend in nominal format order, ending with the race.
///
/// The order is the published weekend format, not necessarily chronological;
/// use [`crate::services::calendar::sorted_sessions`] for display.
pub fn extract_sessions(race: &Race) -> Vec<SessionEntry> {
    let format: &[SessionKind] = if race.is_sprint_weekend() {
        &SPRINT_WEEKEND
    } else {
        &STANDARD_WEEKEND
    };

    let mut sessions: Vec<SessionEntry> = format
        .iter()
        .filter_map(|&kind| slot_for(race, kind).map(|slot| SessionEntry::new(kind, slot)))
        .collect();

    sessions.push(SessionEntry::new(
        SessionKind::Race,
        &SessionSlot {
            date: race.date.clone(),
            time: race.time.clone(),
        },
    ));
    sessions
}
