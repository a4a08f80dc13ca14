use std::time::Duration;

use crate::services::jolpica::DEFAULT_BASE_URL;
use crate::services::refresher::RefreshIntervals;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jolpica_base_url: String,
    pub user_agent: String,
    /// Season to serve; the current UTC year when unset.
    pub season: Option<i32>,
    pub refresh_interval_secs: u64,
    pub retry_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Panics on malformed numbers.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            jolpica_base_url: lookup("JOLPICA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            user_agent: lookup("USER_AGENT").unwrap_or_else(|| {
                format!("F1CalendarApi/{}", env!("CARGO_PKG_VERSION"))
            }),
            season: lookup("SEASON")
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse().expect("SEASON must be a year, e.g. 2025")),
            refresh_interval_secs: lookup("CALENDAR_REFRESH_SECS")
                .unwrap_or_else(|| "21600".to_string())
                .parse()
                .expect("CALENDAR_REFRESH_SECS must be a number of seconds"),
            retry_interval_secs: lookup("CALENDAR_RETRY_SECS")
                .unwrap_or_else(|| "300".to_string())
                .parse()
                .expect("CALENDAR_RETRY_SECS must be a number of seconds"),
        }
    }

    pub fn refresh_intervals(&self) -> RefreshIntervals {
        RefreshIntervals {
            refresh: Duration::from_secs(self.refresh_interval_secs),
            retry: Duration::from_secs(self.retry_interval_secs),
        }
    }
}
