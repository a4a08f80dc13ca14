pub mod calendar;
pub mod clock;
pub mod jobs;
pub mod jolpica;
pub mod refresher;
pub mod reminders;
pub mod sessions;
pub mod timing;
