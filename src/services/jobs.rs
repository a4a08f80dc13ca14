//! One-shot delayed notification jobs.
//!
//! [`JobScheduler`] is the capability the reminder scheduler submits to:
//! uniquely named, tagged jobs that fire once after a delay. [`JobQueue`] is
//! the in-process implementation, one tokio task per pending job:
//! - submitting a name that is already pending replaces it (or is ignored
//!   when `replace_existing` is false)
//! - `cancel_all_tagged` aborts every pending job carrying the tag
//! - a fired job removes only its own entry (generation check), so a job
//!   replaced while firing never evicts its successor

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

/// Content of a delivered reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

/// A request to run a notification once after `delay`.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub unique_name: String,
    pub tag: String,
    pub delay: Duration,
    pub payload: NotificationPayload,
    pub replace_existing: bool,
}

pub trait JobScheduler: Send + Sync {
    /// Abort every pending job with this tag, returning how many were cancelled.
    fn cancel_all_tagged(&self, tag: &str) -> usize;

    /// Enqueue a one-shot job. Returns false when a job with the same name is
    /// already pending and `replace_existing` is false.
    fn submit_once_after_delay(&self, request: JobRequest) -> bool;
}

/// Delivery channel for fired reminders.
pub trait Notifier: Send + Sync {
    fn notify(&self, payload: &NotificationPayload);
}

/// Delivers reminders as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, payload: &NotificationPayload) {
        tracing::info!(title = %payload.title, body = %payload.body, "Session reminder");
    }
}

/// Pending job as exposed on the status endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingJobInfo {
    pub name: String,
    pub tag: String,
    pub fire_at: DateTime<Utc>,
    pub title: String,
}

struct PendingJob {
    generation: u64,
    tag: String,
    fire_at: DateTime<Utc>,
    title: String,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct QueueInner {
    jobs: HashMap<String, PendingJob>,
    next_generation: u64,
}

/// Tokio-backed [`JobScheduler`]. Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Mutex<QueueInner>>,
    notifier: Arc<dyn Notifier>,
}

fn lock(inner: &Mutex<QueueInner>) -> MutexGuard<'_, QueueInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobQueue {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner::default())),
            notifier,
        }
    }

    /// Pending jobs ordered by fire time.
    pub fn pending(&self) -> Vec<PendingJobInfo> {
        let inner = lock(&self.inner);
        let mut jobs: Vec<PendingJobInfo> = inner
            .jobs
            .iter()
            .map(|(name, job)| PendingJobInfo {
                name: name.clone(),
                tag: job.tag.clone(),
                fire_at: job.fire_at,
                title: job.title.clone(),
            })
            .collect();
        jobs.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.name.cmp(&b.name)));
        jobs
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobScheduler for JobQueue {
    fn cancel_all_tagged(&self, tag: &str) -> usize {
        let mut inner = lock(&self.inner);
        let before = inner.jobs.len();
        inner.jobs.retain(|name, job| {
            if job.tag == tag {
                job.handle.abort();
                tracing::trace!("Cancelled job {}", name);
                false
            } else {
                true
            }
        });
        before - inner.jobs.len()
    }

    fn submit_once_after_delay(&self, request: JobRequest) -> bool {
        // Held across spawn + insert so a short-delay job cannot look up its
        // entry before it exists.
        let mut inner = lock(&self.inner);

        if let Some(existing) = inner.jobs.get(&request.unique_name) {
            if !request.replace_existing {
                return false;
            }
            existing.handle.abort();
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        let fire_at = Utc::now()
            + chrono::Duration::from_std(request.delay).unwrap_or(chrono::Duration::zero());

        let name = request.unique_name.clone();
        let payload = request.payload.clone();
        let queue = Arc::clone(&self.inner);
        let notifier = Arc::clone(&self.notifier);
        let delay = request.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let still_current = {
                let mut inner = lock(&queue);
                let is_current = inner
                    .jobs
                    .get(&name)
                    .is_some_and(|job| job.generation == generation);
                if is_current {
                    inner.jobs.remove(&name);
                }
                is_current
            };
            if still_current {
                notifier.notify(&payload);
            }
        });

        inner.jobs.insert(
            request.unique_name,
            PendingJob {
                generation,
                tag: request.tag,
                fire_at,
                title: request.payload.title,
                handle,
            },
        );
        true
    }
}
