pub mod calendar;
pub mod health;
pub mod races;
pub mod reminders;
pub mod standings;

use crate::services::calendar::{effective_season, SharedCalendarState};
use crate::services::clock::SharedClock;
use crate::services::jobs::JobQueue;
use crate::services::jolpica::JolpicaClient;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub clock: SharedClock,
    pub calendar: SharedCalendarState,
    pub client: JolpicaClient,
    pub jobs: JobQueue,
    /// Configured season, if pinned.
    pub season: Option<i32>,
}

impl AppState {
    /// Season of the loaded calendar, else the one the refresher will load.
    pub async fn current_season(&self) -> i32 {
        let loaded = self.calendar.read().await.season;
        loaded.unwrap_or_else(|| effective_season(self.season, self.clock.now()))
    }
}
