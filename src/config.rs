//! Configuration management for taskstream.
//!
//! Configuration lives in `.taskstream/config.toml` under a project
//! directory. Every field has a default, so an absent file or a partial
//! file is always valid.
//!
//! # Example config.toml
//!
//! ```toml
//! [store]
//! event_capacity = 512
//! max_replay_attempts = 3
//! queue_dir = "/var/lib/taskstream/queue"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TaskstreamError};

/// Default capacity of the confirmed-event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default number of transient replay failures before a queued mutation is
/// dropped.
pub const DEFAULT_MAX_REPLAY_ATTEMPTS: u32 = 5;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreConfig,
}

/// Optimistic store and offline queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Capacity of the confirmed-event channel. Slow subscribers lag.
    pub event_capacity: usize,

    /// Transient failures tolerated per queued mutation.
    pub max_replay_attempts: u32,

    /// Directory holding one durable queue file per user.
    ///
    /// `None` keeps the queue in memory only.
    pub queue_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_replay_attempts: DEFAULT_MAX_REPLAY_ATTEMPTS,
            queue_dir: None,
        }
    }
}

impl StoreConfig {
    /// Platform data directory for queue files, if one exists.
    #[must_use]
    pub fn default_queue_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("taskstream").join("queue"))
    }

    /// Use `dir` for durable queue files.
    #[must_use]
    pub fn with_queue_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.queue_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_max_replay_attempts(mut self, attempts: u32) -> Self {
        self.max_replay_attempts = attempts;
        self
    }

    /// Reject values the store cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(TaskstreamError::Config {
                message: "store.event_capacity must be greater than zero".into(),
                path: None,
            });
        }
        if self.max_replay_attempts == 0 {
            return Err(TaskstreamError::config(
                "store.max_replay_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Load configuration from a project directory.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::config_path(project_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            TaskstreamError::config_with_path(e.to_string(), path.clone())
        })?;
        Ok(config)
    }

    /// Parse and validate TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.store.validate()?;
        Ok(config)
    }

    /// Get the config.toml path for a project
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(".taskstream").join("config.toml")
    }
}
