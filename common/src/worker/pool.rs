// Fixed-size worker pool executing job bodies off the trigger thread

use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;
use crate::models::Action;
use crate::telemetry;
use crate::worker::JobDispatcher;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info};

/// Point-in-time counters of a [`WorkerPool`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

impl PoolStats {
    /// Actions queued or running
    pub fn in_flight(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }
}

#[derive(Default)]
struct PoolCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Runs dispatched actions on a dedicated Tokio runtime.
///
/// Job bodies go through `spawn_blocking`, whose pool is capped at
/// `worker_threads`; extra submissions wait inside the runtime. A single
/// async worker supervises each body and records its outcome, so a
/// panicking action is logged and counted without touching the others.
pub struct WorkerPool {
    runtime: Option<Runtime>,
    capacity: usize,
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    pub fn new(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        config
            .validate()
            .map_err(SchedulerError::InvalidConfiguration)?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.worker_threads)
            .thread_name(config.worker_thread_name.clone())
            .build()
            .map_err(SchedulerError::WorkerPool)?;

        info!(
            worker_threads = config.worker_threads,
            thread_name = %config.worker_thread_name,
            "Worker pool started"
        );

        Ok(Self {
            runtime: Some(runtime),
            capacity: config.worker_threads,
            counters: Arc::new(PoolCounters::default()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            submitted: self.counters.submitted.load(Ordering::Acquire),
            completed: self.counters.completed.load(Ordering::Acquire),
            failed: self.counters.failed.load(Ordering::Acquire),
        }
    }
}

impl JobDispatcher for WorkerPool {
    fn submit(&self, action: Action) {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        self.counters.submitted.fetch_add(1, Ordering::AcqRel);
        let counters = Arc::clone(&self.counters);

        runtime.spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || {
                let started = Instant::now();
                action();
                started.elapsed()
            })
            .await;

            match outcome {
                Ok(elapsed) => {
                    counters.completed.fetch_add(1, Ordering::AcqRel);
                    telemetry::record_job_duration(elapsed.as_secs_f64());
                    debug!(duration_ms = elapsed.as_millis() as u64, "Job completed");
                }
                Err(e) if e.is_panic() => {
                    counters.failed.fetch_add(1, Ordering::AcqRel);
                    telemetry::record_job_failure("panic");
                    let payload = e.into_panic();
                    error!(panic = panic_message(payload.as_ref()), "Job panicked");
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::AcqRel);
                    telemetry::record_job_failure("cancelled");
                    debug!(error = %e, "Job cancelled before completion");
                }
            }
        });
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Abandon in-flight bodies instead of blocking on them
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
