// Scheduler engine: the façade callers schedule jobs through

use crate::config::SchedulerConfig;
use crate::errors::{ScheduleError, SchedulerError};
use crate::models::{Action, Job};
use crate::scheduler::queue::JobQueue;
use crate::scheduler::signal::WakeSignal;
use crate::scheduler::trigger::Trigger;
use crate::telemetry;
use crate::worker::{JobDispatcher, PoolStats, WorkerPool};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// An independent scheduler: its own queue, wake signal, trigger thread and
/// worker pool.
///
/// Scheduled jobs repeat for as long as the process lives; there is no
/// cancellation and no shutdown. The trigger thread keeps its own handles to
/// the queue and the worker pool, so dropping the engine does not stop it:
/// pending jobs keep firing on the detached thread and the pool is never
/// torn down.
pub struct SchedulerEngine {
    queue: Arc<JobQueue>,
    signal: Arc<WakeSignal>,
    pool: Option<Arc<WorkerPool>>,
}

impl SchedulerEngine {
    /// Build the worker pool and start the trigger thread
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let pool = Arc::new(WorkerPool::new(&config)?);
        let dispatcher = Arc::clone(&pool) as Arc<dyn JobDispatcher>;
        let mut engine = Self::start(&config, dispatcher)?;
        engine.pool = Some(pool);
        Ok(engine)
    }

    /// Start the trigger thread with a caller-supplied dispatcher
    pub fn with_dispatcher(
        config: SchedulerConfig,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Result<Self, SchedulerError> {
        Self::start(&config, dispatcher)
    }

    fn start(
        config: &SchedulerConfig,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Result<Self, SchedulerError> {
        config
            .validate()
            .map_err(SchedulerError::InvalidConfiguration)?;

        let queue = Arc::new(JobQueue::new());
        let signal = Arc::new(WakeSignal::new());

        Trigger::new(Arc::clone(&queue), Arc::clone(&signal), dispatcher)
            .spawn(&config.trigger_thread_name)
            .map_err(SchedulerError::TriggerSpawn)?;

        info!(
            trigger_thread = %config.trigger_thread_name,
            worker_threads = config.worker_threads,
            "Scheduler engine started"
        );

        Ok(Self {
            queue,
            signal,
            pool: None,
        })
    }

    /// Run `action` after `delay_ms`, then again every `delay_ms` after each
    /// dispatch.
    ///
    /// A zero delay fires immediately, then repeats every
    /// [`MIN_RESCHEDULE_SPACING_MS`](crate::models::MIN_RESCHEDULE_SPACING_MS).
    #[instrument(skip(self, action))]
    pub fn schedule<F>(&self, action: F, delay_ms: i64) -> Result<(), ScheduleError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if delay_ms < 0 {
            warn!("Rejected negative delay");
            return Err(ScheduleError::NegativeDelay { delay_ms });
        }
        self.enqueue(Arc::new(action), ChronoDuration::milliseconds(delay_ms), delay_ms)
    }

    /// Same contract as [`SchedulerEngine::schedule`], with a [`Duration`]
    pub fn schedule_every<F>(&self, action: F, interval: Duration) -> Result<(), ScheduleError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let delay_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
        let interval = ChronoDuration::from_std(interval)
            .map_err(|_| ScheduleError::DelayOutOfRange { delay_ms })?;
        self.enqueue(Arc::new(action), interval, delay_ms)
    }

    fn enqueue(
        &self,
        action: Action,
        interval: ChronoDuration,
        delay_ms: i64,
    ) -> Result<(), ScheduleError> {
        let next_fire_at = Utc::now()
            .checked_add_signed(interval)
            .ok_or(ScheduleError::DelayOutOfRange { delay_ms })?;

        self.queue.insert(Job::new(action, next_fire_at, interval));
        // Permit survives even if the trigger has not parked yet
        self.signal.unpark();

        telemetry::record_job_scheduled();
        telemetry::update_queue_depth(self.queue.len());
        debug!(delay_ms, next_fire_at = %next_fire_at, "Job scheduled");
        Ok(())
    }

    /// Number of jobs waiting in the queue
    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Worker pool counters, when this engine owns its pool
    pub fn pool_stats(&self) -> Option<PoolStats> {
        self.pool.as_ref().map(|pool| pool.stats())
    }
}
