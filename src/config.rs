// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the analog compiler.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. analog.yaml file
//! 3. Environment variables (QUBITOS_ANALOG_*)
//! 4. CLI arguments

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::braket::AQUILA_ARN;
use crate::error::{Error, Result};
use crate::submission::Capabilities;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Batch execution settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Backend configurations
    #[serde(default)]
    pub backends: BackendsConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["analog.yaml", "analog.yml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("QUBITOS_ANALOG_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("QUBITOS_ANALOG_NUM_WORKERS") {
            if let Ok(n) = val.parse() {
                self.backends.emulator.num_workers = Some(n);
            }
        }
        if let Ok(val) = env::var("QUBITOS_ANALOG_MULTIPROCESSING") {
            self.backends.emulator.multiprocessing = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = env::var("QUBITOS_ANALOG_BRAKET_DEVICE_ARN") {
            self.backends.braket.device_arn = val;
        }
        if let Ok(val) = env::var("QUBITOS_ANALOG_POLL_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                self.execution.poll_interval_ms = ms;
            }
        }
        if let Ok(val) = env::var("QUBITOS_ANALOG_TASK_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.execution.task_timeout_secs = secs;
            }
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.execution.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval cannot be 0".into()));
        }
        if self.execution.task_timeout_secs == 0 {
            return Err(Error::Config("task timeout cannot be 0".into()));
        }
        if self.backends.emulator.num_workers == Some(0) {
            return Err(Error::Config("num_workers must be at least 1".into()));
        }
        if self.backends.braket.enabled && self.backends.braket.device_arn.is_empty() {
            return Err(Error::Config(
                "Braket backend is enabled but no device ARN is set".into(),
            ));
        }
        if self.validation.limits.max_shots == 0 || self.validation.limits.max_batch_size == 0 {
            return Err(Error::Config("resource limits must be positive".into()));
        }
        Ok(())
    }

    /// Device capabilities: the configured file, or Aquila's published limits.
    pub fn capabilities(&self) -> Result<Capabilities> {
        match &self.backends.braket.capabilities_path {
            Some(path) => Capabilities::from_file(path),
            None => Ok(Capabilities::aquila()),
        }
    }
}

/// Remote polling and dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Delay between status polls of a remote task
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long one `pull` waits for a remote task before giving up on it
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Dispatch remote tasks in random order
    #[serde(default)]
    pub shuffle: bool,
}

impl ExecutionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            task_timeout_secs: default_task_timeout_secs(),
            shuffle: false,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_task_timeout_secs() -> u64 {
    300
}

/// Backend configurations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Remote Braket hardware
    #[serde(default)]
    pub braket: BraketConfig,

    /// Local emulator
    #[serde(default)]
    pub emulator: EmulatorConfig,
}

/// Braket backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraketConfig {
    /// Whether the backend is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Target device
    #[serde(default = "default_device_arn")]
    pub device_arn: String,

    /// S3 bucket for results
    #[serde(default = "default_s3_bucket")]
    pub s3_bucket: String,

    /// S3 prefix for results
    #[serde(default = "default_s3_prefix")]
    pub s3_prefix: String,

    /// Capabilities file overriding the device defaults
    #[serde(default)]
    pub capabilities_path: Option<PathBuf>,
}

impl Default for BraketConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device_arn: default_device_arn(),
            s3_bucket: default_s3_bucket(),
            s3_prefix: default_s3_prefix(),
            capabilities_path: None,
        }
    }
}

fn default_device_arn() -> String {
    AQUILA_ARN.into()
}

fn default_s3_bucket() -> String {
    "qubit-os-braket-results".into()
}

fn default_s3_prefix() -> String {
    "analog".into()
}

/// Local emulator run defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Run tasks on a worker pool
    #[serde(default)]
    pub multiprocessing: bool,

    /// Worker count; defaults to the number of CPUs
    #[serde(default)]
    pub num_workers: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Validation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Resource limits
    #[serde(default)]
    pub limits: ResourceLimits,
}

/// Resource limits checked before compiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum shots per task
    #[serde(default = "default_max_shots")]
    pub max_shots: u32,

    /// Maximum tasks per batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_shots: default_max_shots(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_max_shots() -> u32 {
    100_000
}

fn default_max_batch_size() -> u32 {
    1000
}
