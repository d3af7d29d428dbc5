// Error handling framework for the scheduling engine

use thiserror::Error;

/// Errors returned to callers of `schedule`
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid delay {delay_ms}ms: delay must not be negative")]
    NegativeDelay { delay_ms: i64 },

    #[error("Invalid delay {delay_ms}ms: next fire time is out of range")]
    DelayOutOfRange { delay_ms: i64 },
}

/// Errors raised while building a scheduler engine
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[source] std::io::Error),

    #[error("Failed to spawn trigger thread: {0}")]
    TriggerSpawn(#[source] std::io::Error),
}
