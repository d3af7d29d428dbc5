// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging with JSON formatting
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level = log_level, "Structured logging initialized");

    Ok(())
}

/// Initialize Prometheus metrics exporter
///
/// Registers:
/// - scheduler_jobs_scheduled_total
/// - scheduler_jobs_dispatched_total
/// - scheduler_job_failures_total
/// - scheduler_queue_depth
/// - scheduler_dispatch_lag_seconds
/// - scheduler_job_duration_seconds
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "scheduler_jobs_scheduled_total",
        "Total number of jobs submitted through schedule()"
    );
    describe_counter!(
        "scheduler_jobs_dispatched_total",
        "Total number of job dispatches to the worker pool"
    );
    describe_counter!(
        "scheduler_job_failures_total",
        "Total number of job executions that panicked"
    );
    describe_gauge!("scheduler_queue_depth", "Current number of pending jobs");
    describe_histogram!(
        "scheduler_dispatch_lag_seconds",
        "Delay between a job's fire time and its dispatch"
    );
    describe_histogram!(
        "scheduler_job_duration_seconds",
        "Duration of job executions in seconds"
    );

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

#[inline]
pub fn record_job_scheduled() {
    counter!("scheduler_jobs_scheduled_total").increment(1);
}

/// Record one dispatch and how late it was relative to the fire time
#[inline]
pub fn record_job_dispatched(lag_seconds: f64) {
    counter!("scheduler_jobs_dispatched_total").increment(1);
    histogram!("scheduler_dispatch_lag_seconds").record(lag_seconds);
}

#[inline]
pub fn record_job_failure(reason: &str) {
    counter!("scheduler_job_failures_total", "reason" => reason.to_string()).increment(1);
}

#[inline]
pub fn record_job_duration(duration_seconds: f64) {
    histogram!("scheduler_job_duration_seconds").record(duration_seconds);
}

#[inline]
pub fn update_queue_depth(depth: usize) {
    gauge!("scheduler_queue_depth").set(depth as f64);
}
