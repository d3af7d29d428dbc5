// Scheduler module: ordered queue, wake signal, trigger loop and façade

pub mod engine;
pub mod queue;
pub mod signal;
pub mod trigger;

pub use engine::SchedulerEngine;
pub use queue::JobQueue;
pub use signal::WakeSignal;
pub use trigger::{Trigger, TriggerState};
