//! Source of "now" for everything time-dependent.
//!
//! Routes, the refresher and the reminder scheduler read the current instant
//! through [`Clock`] so tests can pin it.

use chrono::{DateTime, Utc};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// A clock frozen at a given instant, adjustable between assertions.
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl FixedClock {
    pub fn at(rfc3339: &str) -> Self {
        let now = rfc3339
            .parse::<DateTime<Utc>>()
            .expect("FixedClock needs an RFC 3339 instant");
        Self(std::sync::Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_can_be_moved() {
        let clock = FixedClock::at("2025-12-07T13:00:00Z");
        assert_eq!(
            clock.now(),
            "2025-12-07T13:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );

        clock.set("2025-12-07T15:00:01Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(
            clock.now(),
            "2025-12-07T15:00:01Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
    }
}
