//! Service configuration
//!
//! Everything the wrapper needs to know about the service it registers,
//! loadable from the `[service]` table of a TOML file.

mod kinds;

pub use kinds::{EventType, EventTypes, StartType};

use crate::error::{Error, Result};
use crate::status::Accepted;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration of a wrapped service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name, also used as the event-log source
    pub name: String,
    /// Name shown in the services console
    pub display_name: String,
    /// Description shown in the services console
    pub description: String,
    /// Change to the executable's directory on startup
    pub use_exe_dir_as_working_dir: bool,
    /// How the service is started
    pub start_type: StartType,
    /// Arguments appended to the registered command line
    pub launch_arguments: Vec<String>,
    /// Arguments passed when the service is started by `start`
    pub start_arguments: Vec<String>,
    /// Accept pause and continue controls
    pub accept_pause_continue: bool,
    /// Event types registered for the event-log source
    pub event_types: Vec<EventType>,
    /// Seconds allowed for a state transition after a control
    pub control_timeout_secs: u64,
    /// Milliseconds between two status queries while waiting
    pub poll_interval_ms: u64,
    /// Seconds reported as wait hint with pending states
    pub wait_hint_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            description: String::new(),
            use_exe_dir_as_working_dir: false,
            start_type: StartType::Automatic,
            launch_arguments: vec!["is".to_string(), "auto-started".to_string()],
            start_arguments: vec!["is".to_string(), "manual-started".to_string()],
            accept_pause_continue: false,
            event_types: vec![EventType::Error, EventType::Warning, EventType::Info],
            control_timeout_secs: 10,
            poll_interval_ms: 300,
            wait_hint_secs: 10,
        }
    }
}

impl ServiceConfig {
    /// Configuration with the four identifying fields set
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        use_exe_dir_as_working_dir: bool,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            use_exe_dir_as_working_dir,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config_value("name", "must not be empty"));
        }
        if self.name.contains(['/', '\\']) {
            return Err(Error::config_value("name", "must not contain '/' or '\\'"));
        }
        if self.name.len() > 256 {
            return Err(Error::config_value("name", "must be at most 256 characters"));
        }
        if self.control_timeout_secs == 0 {
            return Err(Error::config_value("control_timeout_secs", "must be greater than 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config_value("poll_interval_ms", "must be greater than 0"));
        }
        if self.poll_interval() > self.control_timeout() {
            return Err(Error::config_value(
                "poll_interval_ms",
                "must not exceed control_timeout_secs",
            ));
        }
        Ok(())
    }

    /// Display name, falling back to the service name
    pub fn effective_display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Controls accepted while running
    pub fn accepted_controls(&self) -> Accepted {
        let mut accepts = Accepted::STOP | Accepted::SHUTDOWN;
        if self.accept_pause_continue {
            accepts |= Accepted::PAUSE_CONTINUE;
        }
        accepts
    }

    /// Event types as a bit set
    pub fn event_type_set(&self) -> EventTypes {
        EventTypes::from_kinds(&self.event_types)
    }

    /// Time allowed for a state transition
    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_secs)
    }

    /// Delay between two status queries
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wait hint for pending states
    pub fn wait_hint(&self) -> Duration {
        Duration::from_secs(self.wait_hint_secs)
    }
}
