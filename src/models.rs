//! Domain types for the season calendar, standings and session results.
//!
//! These are built from the Jolpica wire types in `services::jolpica` and
//! held in memory until the next calendar fetch replaces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// A scheduled session slot (practice, qualifying, shootout, sprint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionSlot {
    /// Calendar date, e.g. "2025-12-05"
    pub date: String,
    /// Start time, e.g. "09:30:00Z"; absent when the upstream has not published it
    pub time: Option<String>,
}

impl SessionSlot {
    pub fn new(date: &str, time: Option<&str>) -> Self {
        Self {
            date: date.to_string(),
            time: time.map(str::to_string),
        }
    }
}

/// One race weekend of the season.
#[derive(Debug, Clone)]
pub struct Race {
    /// Season-unique round identifier, the key for results lookups.
    pub round: String,
    pub name: String,
    pub circuit_name: String,
    /// Country the circuit is in.
    pub location: String,
    pub date: String,
    pub time: Option<String>,
    pub first_practice: Option<SessionSlot>,
    pub second_practice: Option<SessionSlot>,
    pub third_practice: Option<SessionSlot>,
    pub qualifying: Option<SessionSlot>,
    pub sprint_qualifying: Option<SessionSlot>,
    pub sprint: Option<SessionSlot>,
    /// Computed once at load time from `date` + `time`. Falls back to the load
    /// time when the source timestamp is unparseable.
    pub race_instant: DateTime<Utc>,
}

impl Race {
    /// Sprint weekends carry a shootout and/or a sprint slot.
    pub fn is_sprint_weekend(&self) -> bool {
        self.sprint.is_some() || self.sprint_qualifying.is_some()
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Driver {
    pub driver_id: String,
    pub given_name: String,
    pub family_name: String,
    /// Three-letter code, e.g. "VER"
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Constructor {
    pub constructor_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DriverStanding {
    pub position: String,
    pub points: String,
    pub wins: String,
    pub driver: Driver,
    pub constructors: Vec<Constructor>,
}

// ---------------------------------------------------------------------------
// Session results
// ---------------------------------------------------------------------------

/// Which results table a lookup targets. Together with `round` this is the
/// only key the upstream results endpoints accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Race,
    Qualifying,
    Sprint,
}

impl SessionType {
    /// Path segment of the upstream endpoint (`{season}/{round}/<segment>.json`).
    pub fn endpoint(self) -> &'static str {
        match self {
            SessionType::Race => "results",
            SessionType::Qualifying => "qualifying",
            SessionType::Sprint => "sprint",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionType::Race => "RACE",
            SessionType::Qualifying => "QUALIFYING",
            SessionType::Sprint => "SPRINT",
        };
        f.write_str(s)
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "race" => Ok(SessionType::Race),
            "qualifying" => Ok(SessionType::Qualifying),
            "sprint" => Ok(SessionType::Sprint),
            other => Err(format!("Unknown session type '{}'", other)),
        }
    }
}

/// Classified result of a race or sprint.
#[derive(Debug, Clone)]
pub struct RaceResult {
    pub position: String,
    pub points: Option<String>,
    pub driver: Driver,
    pub constructor: Constructor,
    /// Finishing time, e.g. "1:27:22.115" or "+5.832s"
    pub time: Option<String>,
    /// "Finished", "Lapped", "Retired", ...
    pub status: String,
}

/// Qualifying classification with the best segment times reached.
#[derive(Debug, Clone)]
pub struct QualifyingResult {
    pub position: String,
    pub driver: Driver,
    pub constructor: Constructor,
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
}

/// A result row of any session type.
#[derive(Debug, Clone)]
pub enum ResultItem {
    Race(RaceResult),
    Qualifying(QualifyingResult),
    Sprint(RaceResult),
}

impl ResultItem {
    pub fn position(&self) -> &str {
        match self {
            ResultItem::Race(r) | ResultItem::Sprint(r) => &r.position,
            ResultItem::Qualifying(q) => &q.position,
        }
    }

    pub fn driver(&self) -> &Driver {
        match self {
            ResultItem::Race(r) | ResultItem::Sprint(r) => &r.driver,
            ResultItem::Qualifying(q) => &q.driver,
        }
    }

    pub fn constructor(&self) -> &Constructor {
        match self {
            ResultItem::Race(r) | ResultItem::Sprint(r) => &r.constructor,
            ResultItem::Qualifying(q) => &q.constructor,
        }
    }

    /// Finishing time, else status for races; best segment reached for qualifying.
    pub fn time_or_status(&self) -> &str {
        match self {
            ResultItem::Race(r) | ResultItem::Sprint(r) => {
                r.time.as_deref().unwrap_or(&r.status)
            }
            ResultItem::Qualifying(q) => q
                .q3
                .as_deref()
                .or(q.q2.as_deref())
                .or(q.q1.as_deref())
                .unwrap_or("No Time"),
        }
    }

    /// Qualifying awards no points.
    pub fn points(&self) -> Option<&str> {
        match self {
            ResultItem::Race(r) | ResultItem::Sprint(r) => r.points.as_deref(),
            ResultItem::Qualifying(_) => None,
        }
    }
}

/// Whether a fetch returned rows or the upstream has nothing published yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataState {
    Ready,
    Empty,
}

impl DataState {
    pub fn of<T>(rows: &[T]) -> Self {
        if rows.is_empty() {
            DataState::Empty
        } else {
            DataState::Ready
        }
    }
}

/// Sort rows by numeric position; unclassified positions keep their order at the end.
pub fn sort_by_position<T>(items: &mut [T], position: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| position(item).trim().parse::<u32>().unwrap_or(u32::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(code: &str) -> Driver {
        Driver {
            driver_id: code.to_lowercase(),
            given_name: "Given".to_string(),
            family_name: "Family".to_string(),
            code: Some(code.to_string()),
        }
    }

    fn constructor() -> Constructor {
        Constructor {
            constructor_id: "mclaren".to_string(),
            name: "McLaren".to_string(),
        }
    }

    fn race_result(time: Option<&str>, status: &str) -> RaceResult {
        RaceResult {
            position: "1".to_string(),
            points: Some("25".to_string()),
            driver: driver("NOR"),
            constructor: constructor(),
            time: time.map(str::to_string),
            status: status.to_string(),
        }
    }

    fn quali(q1: Option<&str>, q2: Option<&str>, q3: Option<&str>) -> ResultItem {
        ResultItem::Qualifying(QualifyingResult {
            position: "4".to_string(),
            driver: driver("PIA"),
            constructor: constructor(),
            q1: q1.map(str::to_string),
            q2: q2.map(str::to_string),
            q3: q3.map(str::to_string),
        })
    }

    #[test]
    fn test_race_result_prefers_time_over_status() {
        let item = ResultItem::Race(race_result(Some("1:27:22.115"), "Finished"));
        assert_eq!(item.time_or_status(), "1:27:22.115");
        assert_eq!(item.points(), Some("25"));
    }

    #[test]
    fn test_race_result_falls_back_to_status() {
        let item = ResultItem::Sprint(race_result(None, "Retired"));
        assert_eq!(item.time_or_status(), "Retired");
    }

    #[test]
    fn test_qualifying_uses_best_segment_reached() {
        assert_eq!(
            quali(Some("1:16.1"), Some("1:15.9"), Some("1:15.5")).time_or_status(),
            "1:15.5"
        );
        assert_eq!(
            quali(Some("1:16.1"), Some("1:15.9"), None).time_or_status(),
            "1:15.9"
        );
        assert_eq!(quali(Some("1:16.1"), None, None).time_or_status(), "1:16.1");
        assert_eq!(quali(None, None, None).time_or_status(), "No Time");
    }

    #[test]
    fn test_qualifying_has_no_points() {
        assert_eq!(quali(None, None, None).points(), None);
    }

    #[test]
    fn test_session_type_from_str_is_case_insensitive() {
        assert_eq!("RACE".parse::<SessionType>(), Ok(SessionType::Race));
        assert_eq!("qualifying".parse::<SessionType>(), Ok(SessionType::Qualifying));
        assert_eq!("Sprint".parse::<SessionType>(), Ok(SessionType::Sprint));
        assert!("practice".parse::<SessionType>().is_err());
    }

    #[test]
    fn test_session_type_endpoints() {
        assert_eq!(SessionType::Race.endpoint(), "results");
        assert_eq!(SessionType::Qualifying.endpoint(), "qualifying");
        assert_eq!(SessionType::Sprint.endpoint(), "sprint");
    }

    #[test]
    fn test_data_state_of() {
        assert_eq!(DataState::of::<u8>(&[]), DataState::Empty);
        assert_eq!(DataState::of(&[1]), DataState::Ready);
    }

    #[test]
    fn test_sort_by_position_puts_unclassified_last() {
        let mut rows = vec!["R", "3", "1", "D", "2"];
        sort_by_position(&mut rows, |s| *s);
        assert_eq!(rows, vec!["1", "2", "3", "R", "D"]);
    }
}
