//! Session timestamp parsing, completion and countdown arithmetic.
//!
//! The upstream publishes a session as a calendar date plus an optional
//! start time (`"2025-12-07"` + `"13:00:00Z"`). Every time comparison in the
//! service goes through [`SessionTimestamp`] so that the default-time rule and
//! the handling of malformed values are the same everywhere:
//!
//! - missing time → `00:00:00Z` of the date
//! - `date` + `T` + `time` parsed as RFC 3339; a time with no offset is UTC
//! - anything else is [`SessionTimestamp::Invalid`], which sorts last, never
//!   counts as completed and is never scheduled

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Substituted when a session has no published start time.
pub const DEFAULT_SESSION_TIME: &str = "00:00:00Z";

/// A session counts as in progress for this long after its nominal start.
pub const COMPLETION_GRACE_HOURS: i64 = 2;

/// Parsed form of a `(date, time)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTimestamp {
    Parsed(DateTime<Utc>),
    Invalid { raw: String },
}

impl SessionTimestamp {
    pub fn parse(date: &str, time: Option<&str>) -> Self {
        let raw = format!(
            "{}T{}",
            date.trim(),
            time.map(str::trim).unwrap_or(DEFAULT_SESSION_TIME)
        );
        match parse_combined(&raw) {
            Some(instant) => SessionTimestamp::Parsed(instant),
            None => SessionTimestamp::Invalid { raw },
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionTimestamp::Parsed(instant) => Some(*instant),
            SessionTimestamp::Invalid { .. } => None,
        }
    }

    /// Comparison key for chronological sorting: invalid timestamps map to the
    /// maximum representable instant.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.instant().unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

fn parse_combined(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// Whether a session is over: strictly more than the grace window has passed
/// since its start. Exactly at `start + 2h` it is still in progress.
/// Unparseable timestamps are never completed.
pub fn is_completed(date: &str, time: Option<&str>, now: DateTime<Utc>) -> bool {
    match SessionTimestamp::parse(date, time) {
        SessionTimestamp::Parsed(start) => now > start + Duration::hours(COMPLETION_GRACE_HOURS),
        SessionTimestamp::Invalid { raw } => {
            tracing::debug!("Treating unparseable session time '{}' as not completed", raw);
            false
        }
    }
}

/// Time remaining until an instant, clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_seconds: i64,
}

impl Countdown {
    pub fn between(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let total_seconds = (target - now).num_seconds().max(0);
        Self {
            days: total_seconds / 86_400,
            hours: (total_seconds % 86_400) / 3_600,
            minutes: (total_seconds % 3_600) / 60,
            seconds: total_seconds % 60,
            total_seconds,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().unwrap()
    }

    #[test]
    fn test_parse_with_zulu_time() {
        let ts = SessionTimestamp::parse("2025-12-07", Some("13:00:00Z"));
        assert_eq!(ts, SessionTimestamp::Parsed(at("2025-12-07T13:00:00Z")));
    }

    #[test]
    fn test_missing_time_defaults_to_midnight_utc() {
        let ts = SessionTimestamp::parse("2025-12-07", None);
        assert_eq!(ts.instant(), Some(at("2025-12-07T00:00:00Z")));
    }

    #[test]
    fn test_time_without_offset_is_utc() {
        let ts = SessionTimestamp::parse("2025-12-07", Some("13:00:00"));
        assert_eq!(ts.instant(), Some(at("2025-12-07T13:00:00Z")));
    }

    #[test]
    fn test_explicit_offset_is_respected() {
        let ts = SessionTimestamp::parse("2025-12-07", Some("17:00:00+04:00"));
        assert_eq!(ts.instant(), Some(at("2025-12-07T13:00:00Z")));
    }

    #[test]
    fn test_invalid_sorts_at_max() {
        let ts = SessionTimestamp::parse("TBC", Some("13:00:00Z"));
        assert!(matches!(ts, SessionTimestamp::Invalid { .. }));
        assert_eq!(ts.sort_key(), DateTime::<Utc>::MAX_UTC);
        assert_eq!(ts.instant(), None);
    }

    #[test]
    fn test_is_completed_boundary_is_exclusive() {
        let start = at("2025-12-07T13:00:00Z");
        let boundary = start + Duration::hours(2);

        assert!(!is_completed("2025-12-07", Some("13:00:00Z"), start));
        assert!(!is_completed(
            "2025-12-07",
            Some("13:00:00Z"),
            boundary - Duration::seconds(1)
        ));
        assert!(!is_completed("2025-12-07", Some("13:00:00Z"), boundary));
        assert!(is_completed(
            "2025-12-07",
            Some("13:00:00Z"),
            boundary + Duration::milliseconds(1)
        ));
    }

    #[test]
    fn test_is_completed_without_time_uses_midnight() {
        assert!(!is_completed("2025-12-07", None, at("2025-12-07T02:00:00Z")));
        assert!(is_completed("2025-12-07", None, at("2025-12-07T02:00:01Z")));
    }

    #[test]
    fn test_is_completed_fails_open_on_garbage() {
        assert!(!is_completed("not-a-date", Some("??"), at("2099-01-01T00:00:00Z")));
    }

    #[test]
    fn test_countdown_components() {
        let now = at("2025-12-05T10:00:00Z");
        let target = at("2025-12-07T13:04:05Z");
        let c = Countdown::between(now, target);
        assert_eq!((c.days, c.hours, c.minutes, c.seconds), (2, 3, 4, 5));
        assert_eq!(c.to_string(), "2d 03:04:05");
        assert_eq!(c.total_seconds, 2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
    }

    #[test]
    fn test_countdown_clamps_past_targets() {
        let c = Countdown::between(at("2025-12-07T14:00:00Z"), at("2025-12-07T13:00:00Z"));
        assert_eq!(c.total_seconds, 0);
        assert_eq!(c.to_string(), "0d 00:00:00");
    }
}
