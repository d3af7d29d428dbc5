// In-process periodic job scheduler shared by the scheduler binary and tests

pub mod config;
pub mod errors;
pub mod models;
pub mod scheduler;
pub mod telemetry;
pub mod worker;
