//! Session reminder scheduling.
//!
//! Every successful calendar load triggers one full pass over the season:
//! - cancel every job tagged [`REMINDER_TAG`] from earlier passes
//! - skip races starting within [`RACE_SKIP_WINDOW_HOURS`] (or already started)
//! - for every other session (race included) submit a job firing
//!   [`REMINDER_LEAD_MINUTES`] before its start, unless that is already past
//!
//! Job names are derived from race name + session label, and submitted with
//! replace semantics, so repeating a pass never leaves two live reminders for
//! the same session. The pass itself is synchronous; it only talks to the
//! [`JobScheduler`] it is given.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::helpers::slugify;
use crate::models::Race;
use crate::services::jobs::{JobRequest, JobScheduler, NotificationPayload};
use crate::services::sessions::{extract_sessions, SessionKind};
use crate::services::timing::SessionTimestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Tag carried by every reminder job, used for bulk cancellation.
pub const REMINDER_TAG: &str = "f1_notification_schedule";

/// Prefix of every reminder job name.
const JOB_NAME_PREFIX: &str = "f1_notification";

/// Reminders fire this long before a session starts.
pub const REMINDER_LEAD_MINUTES: i64 = 15;

/// Races starting sooner than this are skipped entirely.
pub const RACE_SKIP_WINDOW_HOURS: i64 = 2;

/// Delays shorter than this are not worth scheduling.
const MIN_DELAY_MILLIS: i64 = 1_000;

// ---------------------------------------------------------------------------
// Pass outcome
// ---------------------------------------------------------------------------

/// A reminder submitted during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScheduledReminder {
    pub job_name: String,
    pub round: String,
    pub race_name: String,
    pub session: SessionKind,
    pub session_start: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
    pub delay_ms: i64,
}

/// Summary of one scheduling pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReminderPass {
    pub ran_at: DateTime<Utc>,
    /// Jobs from earlier passes cancelled before scheduling.
    pub cancelled: usize,
    /// Races skipped because they start within the skip window.
    pub skipped_races: usize,
    /// Sessions skipped because their start time could not be parsed.
    pub invalid_sessions: usize,
    pub scheduled: Vec<ScheduledReminder>,
}

/// Deterministic job name for a session of a race.
pub fn job_name(race_name: &str, session: SessionKind) -> String {
    format!(
        "{}_{}_{}",
        JOB_NAME_PREFIX,
        slugify(race_name),
        slugify(session.label())
    )
}

fn payload_for(race: &Race, session: SessionKind) -> NotificationPayload {
    NotificationPayload {
        title: format!("UPCOMING: {} - {}", race.name, session.label()),
        body: format!("Session starts in {} minutes.", REMINDER_LEAD_MINUTES),
    }
}

// ---------------------------------------------------------------------------
// Scheduling pass
// ---------------------------------------------------------------------------

/// Replace all reminder jobs with a fresh set computed from `races` at `now`.
pub fn schedule_all(races: &[Race], now: DateTime<Utc>, scheduler: &dyn JobScheduler) -> ReminderPass {
    let cancelled = scheduler.cancel_all_tagged(REMINDER_TAG);

    let mut pass = ReminderPass {
        ran_at: now,
        cancelled,
        skipped_races: 0,
        invalid_sessions: 0,
        scheduled: Vec::new(),
    };

    let skip_before = now + Duration::hours(RACE_SKIP_WINDOW_HOURS);
    for race in races {
        if race.race_instant < skip_before {
            pass.skipped_races += 1;
            continue;
        }
        schedule_race(race, now, scheduler, &mut pass);
    }

    tracing::info!(
        "Reminders: scheduled {} session reminders ({} cancelled, {} races skipped, {} invalid sessions)",
        pass.scheduled.len(),
        pass.cancelled,
        pass.skipped_races,
        pass.invalid_sessions,
    );

    pass
}

fn schedule_race(race: &Race, now: DateTime<Utc>, scheduler: &dyn JobScheduler, pass: &mut ReminderPass) {
    for session in extract_sessions(race) {
        let start = match &session.timestamp {
            SessionTimestamp::Parsed(start) => *start,
            SessionTimestamp::Invalid { raw } => {
                tracing::warn!(
                    "Reminders: skipping {} of '{}' (round {}), unparseable time '{}'",
                    session.label(),
                    race.name,
                    race.round,
                    raw
                );
                pass.invalid_sessions += 1;
                continue;
            }
        };

        let fire_at = start - Duration::minutes(REMINDER_LEAD_MINUTES);
        if fire_at <= now {
            continue;
        }

        let delay = fire_at - now;
        if delay.num_milliseconds() < MIN_DELAY_MILLIS {
            continue;
        }
        let Ok(delay_std) = delay.to_std() else {
            continue;
        };

        let name = job_name(&race.name, session.kind);
        let submitted = scheduler.submit_once_after_delay(JobRequest {
            unique_name: name.clone(),
            tag: REMINDER_TAG.to_string(),
            delay: delay_std,
            payload: payload_for(race, session.kind),
            replace_existing: true,
        });
        if !submitted {
            continue;
        }

        tracing::debug!(
            "Reminders: {} fires at {} (in {}s)",
            name,
            fire_at,
            delay.num_seconds()
        );

        pass.scheduled.push(ScheduledReminder {
            job_name: name,
            round: race.round.clone(),
            race_name: race.name.clone(),
            session: session.kind,
            session_start: start,
            fire_at,
            delay_ms: delay.num_milliseconds(),
        });
    }
}
