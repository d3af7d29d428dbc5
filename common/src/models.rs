// Data model for scheduled jobs

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

/// Floor on the spacing between occurrences; keeps zero-interval jobs from
/// re-firing on every trigger pass
pub const MIN_RESCHEDULE_SPACING_MS: i64 = 1;

/// Job body: a shared callable with no arguments and no result
pub type Action = Arc<dyn Fn() + Send + Sync + 'static>;

/// One scheduled unit of work.
///
/// `next_fire_at` is always absolute. Each dispatch builds a replacement job
/// through [`Job::reschedule`] rather than shifting the old deadline, so a
/// stalled process resumes with a single dispatch and no catch-up.
#[derive(Clone)]
pub struct Job {
    action: Action,
    next_fire_at: DateTime<Utc>,
    interval: Duration,
}

impl Job {
    /// Create a job. Negative intervals are clamped to zero.
    pub fn new(action: Action, next_fire_at: DateTime<Utc>, interval: Duration) -> Self {
        Self {
            action,
            next_fire_at,
            interval: interval.max(Duration::zero()),
        }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn next_fire_at(&self) -> DateTime<Utc> {
        self.next_fire_at
    }

    /// Next fire time as milliseconds since the Unix epoch
    pub fn next_fire_time_millis(&self) -> i64 {
        self.next_fire_at.timestamp_millis()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    pub fn set_next_fire_at(&mut self, next_fire_at: DateTime<Utc>) {
        self.next_fire_at = next_fire_at;
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::zero());
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_fire_at <= now
    }

    /// Build the next occurrence, firing one interval after `now`.
    ///
    /// Intervals shorter than [`MIN_RESCHEDULE_SPACING_MS`] are spaced by that
    /// floor instead.
    pub fn reschedule(&self, now: DateTime<Utc>) -> Job {
        let spacing = self
            .interval
            .max(Duration::milliseconds(MIN_RESCHEDULE_SPACING_MS));
        let next_fire_at = now
            .checked_add_signed(spacing)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Job {
            action: Arc::clone(&self.action),
            next_fire_at,
            interval: self.interval,
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("next_fire_at", &self.next_fire_at)
            .field("interval_ms", &self.interval.num_milliseconds())
            .finish_non_exhaustive()
    }
}
