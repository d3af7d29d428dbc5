// Scheduler binary entry point
// Prints a timestamped "a" every second and a "b" every two seconds

use anyhow::Result;
use chrono::Local;
use common::config::Settings;
use common::scheduler::SchedulerEngine;
use common::telemetry;
use std::time::Duration;
use tracing::{error, info};

fn print_tick(label: &'static str) -> impl Fn() + Send + Sync + 'static {
    move || println!("{} {}", Local::now().format("%H:%M:%S"), label)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(&settings.observability.log_level)?;
    info!("Starting periodic scheduler demo");

    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port)?;
    }

    let scheduler = SchedulerEngine::new(settings.scheduler.clone()).map_err(|e| {
        error!(error = %e, "Failed to start scheduler engine");
        e
    })?;

    scheduler.schedule(print_tick("a"), 1000)?;

    // The second job starts one second later, on top of its own two-second delay
    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.schedule(print_tick("b"), 2000)?;

    tokio::signal::ctrl_c().await?;
    info!(
        pending_jobs = scheduler.pending_jobs(),
        "Received Ctrl+C signal, exiting"
    );

    Ok(())
}
