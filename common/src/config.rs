// Configuration management with layered configuration (defaults, file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub scheduler: SchedulerConfig,
    pub observability: ObservabilityConfig,
}

/// Sizing and naming of the engine's threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of threads executing job bodies
    pub worker_threads: usize,
    pub trigger_thread_name: String,
    pub worker_thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: 3,
            trigger_thread_name: "scheduler-trigger".to_string(),
            worker_thread_name: "scheduler-worker".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == 0 {
            return Err("Scheduler worker_threads must be greater than 0".to_string());
        }
        if self.trigger_thread_name.is_empty() {
            return Err("Scheduler trigger_thread_name cannot be empty".to_string());
        }
        if self.worker_thread_name.is_empty() {
            return Err("Scheduler worker_thread_name cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// Prometheus exporter port; metrics stay in-process when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_port: None,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with built-in defaults so every file is optional
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        self.scheduler.validate()?;

        if self.observability.log_level.is_empty() {
            return Err("Observability log_level cannot be empty".to_string());
        }
        if self.observability.metrics_port == Some(0) {
            return Err("Observability metrics_port must be greater than 0".to_string());
        }

        Ok(())
    }
}
