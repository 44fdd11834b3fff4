//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TurnstileError};
use crate::lockout::LockoutPolicy;

/// Main configuration for the Turnstile library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Named rate limit policies (contact_form, quote_form, login, ...).
    #[serde(default)]
    pub policies: HashMap<String, PolicyConfig>,

    /// Account lockout configuration
    #[serde(default)]
    pub lockout: LockoutConfig,

    /// Stale entry sweep configuration
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Configuration for one named rate limit policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum requests allowed in the window
    pub limit: u32,

    /// Window length in milliseconds
    pub window_ms: u64,
}

impl PolicyConfig {
    /// The window as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Account lockout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Failed attempts before lockout
    #[serde(default = "default_lockout_threshold")]
    pub threshold: u32,

    /// Lockout duration in milliseconds
    #[serde(default = "default_lockout_duration_ms")]
    pub duration_ms: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            threshold: default_lockout_threshold(),
            duration_ms: default_lockout_duration_ms(),
        }
    }
}

impl LockoutConfig {
    /// Build the validated lockout policy.
    pub fn policy(&self) -> Result<LockoutPolicy> {
        LockoutPolicy::new(self.threshold, Duration::from_millis(self.duration_ms))
    }
}

fn default_lockout_threshold() -> u32 {
    5
}

fn default_lockout_duration_ms() -> u64 {
    5 * 60 * 1_000
}

/// Stale entry sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep passes
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,

    /// Keys idle longer than this many milliseconds are removed
    #[serde(default = "default_sweep_retention_ms")]
    pub retention_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
            retention_ms: default_sweep_retention_ms(),
        }
    }
}

impl SweepConfig {
    /// The sweep interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// The retention horizon as a `Duration`.
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_sweep_retention_ms() -> u64 {
    60 * 60 * 1_000
}

impl TurnstileConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading admission control configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse config: {}", e)))
    }
}
