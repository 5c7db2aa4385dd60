//! wave3ctl configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wave3ctl_core::DEFAULT_POLL_INTERVAL;
use wave3ctl_transfer::DEFAULT_DEVICE_PATH;

/// wave3ctl configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Device settings
    #[serde(default)]
    pub device: DeviceConfig,
    /// Monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Control node created by the kernel module
    #[serde(default = "default_device_path")]
    pub path: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { path: default_device_path() }
    }
}

fn default_device_path() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE_PATH)
}

/// Monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Polling interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval_ms: default_interval_ms() }
    }
}

impl MonitorConfig {
    /// Polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Load configuration.
///
/// An explicitly given file must exist. The default location falls back to
/// built-in defaults when there is no file.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_from(path);
    }

    let config_path = config_path()?;
    if config_path.exists() {
        load_from(&config_path)
    } else {
        debug!(?config_path, "Config file not found, using defaults");
        Ok(Config::default())
    }
}

fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {path:?}"))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {path:?}"))?;
    Ok(config)
}

/// Get the configuration file path.
fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "wave3ctl", "wave3ctl")
        .context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
