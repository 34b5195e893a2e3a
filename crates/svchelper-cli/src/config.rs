//! Demo configuration file

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use svchelper_core::ServiceConfig;
use tracing::debug;

/// File looked up next to the executable when no `--config` is given
pub const DEFAULT_FILE_NAME: &str = "svchelper.toml";

/// Complete demo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Service registration and control settings
    pub service: ServiceConfig,
    /// Heartbeat task settings
    pub heartbeat: HeartbeatConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::new(
                "svchelper-demo",
                "svchelper demo",
                "Logs a heartbeat until it is stopped",
                true,
            ),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

/// Heartbeat task settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Milliseconds between beats
    pub interval_ms: u64,
    /// Stop the service after this many beats
    pub max_beats: Option<u64>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_beats: None,
        }
    }
}

impl HeartbeatConfig {
    /// Interval between beats
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl DemoConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// `explicit` when given, else the default file next to `exe` if it
    /// exists, else built-in defaults
    pub fn resolve(explicit: Option<&Path>, exe: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match exe.and_then(default_path) {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "Using configuration next to the executable");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Check all values
    pub fn validate(&self) -> Result<()> {
        self.service.validate()?;
        if self.heartbeat.interval_ms == 0 {
            bail!("heartbeat.interval_ms must be greater than 0");
        }
        Ok(())
    }
}

fn default_path(exe: &Path) -> Option<PathBuf> {
    exe.parent().map(|dir| dir.join(DEFAULT_FILE_NAME))
}
