//! Unified configuration for the planning service.
//!
//! [`PlannerConfig`] follows the same per-section, all-optional style as
//! the teacher's `GatConfig`: every field has a sensible default so a
//! partial TOML document only needs to name the values it overrides.
//!
//! Configuration is stored in `~/.farmplan/config.toml` and supports partial
//! configs where unspecified values use sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Main configuration for the planning service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlannerConfig {
    /// Stage sequencing and solver defaults.
    pub core: CoreConfig,

    /// In-process job backend tuning.
    pub jobs: JobConfig,

    /// Durable backend environment knobs (§6's table/bucket/queue selectors).
    pub durable: DurableConfig,
}

/// Stage-sequencing and solver defaults shared by every backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Canonical stage order when a request doesn't override it.
    pub default_stages: Vec<String>,

    /// Per-stage tolerance applied when a request doesn't override it.
    pub default_tolerance: f64,

    /// Wall-clock budget per stage solve.
    pub stage_time_limit_ms: u64,

    /// Wall-clock deadline for a synchronous `/optimize` call, covering all
    /// stages.
    pub sync_deadline_ms: u64,

    /// Wall-clock deadline for an async job before it's marked `timeout`.
    pub async_deadline_ms: u64,

    /// Search-thread hint passed to the underlying solver.
    pub solver_worker_count: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_stages: vec!["profit".to_string(), "dispersion".to_string()],
            default_tolerance: 0.0,
            stage_time_limit_ms: 10_000,
            sync_deadline_ms: 30_000,
            async_deadline_ms: 300_000,
            solver_worker_count: 0,
        }
    }
}

impl CoreConfig {
    pub fn stage_time_limit(&self) -> Duration {
        Duration::from_millis(self.stage_time_limit_ms)
    }

    pub fn sync_deadline(&self) -> Duration {
        Duration::from_millis(self.sync_deadline_ms)
    }

    pub fn async_deadline(&self) -> Duration {
        Duration::from_millis(self.async_deadline_ms)
    }
}

/// In-process job backend tuning: the bounded worker pool's size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Maximum jobs executing concurrently in the in-process backend.
    pub pool_capacity: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self { pool_capacity: 4 }
    }
}

/// Durable backend selector and the environment knobs named in §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DurableConfig {
    /// Which job backend a deployment uses: `inmemory` or `durable`.
    pub backend: String,

    /// Transactional table name for job rows.
    pub table_name: String,

    /// Blob bucket for request/result payloads.
    pub blob_bucket: String,

    /// Message bus queue URL/ARN.
    pub queue_url: String,

    /// Row TTL in days.
    pub ttl_days: u32,
}

impl Default for DurableConfig {
    fn default() -> Self {
        Self {
            backend: "inmemory".to_string(),
            table_name: "farmplan-jobs".to_string(),
            blob_bucket: "farmplan-payloads".to_string(),
            queue_url: String::new(),
            ttl_days: 7,
        }
    }
}

impl PlannerConfig {
    /// Get the default config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".farmplan"))
    }

    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| PlannerError::Config("could not determine config directory".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
