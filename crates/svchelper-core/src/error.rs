//! Error types for svchelper-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use std::path::PathBuf;
use thiserror::Error;

use crate::status::State;

/// Main error type for svchelper-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// The resolved executable path points at a directory
    #[error("{} is directory", path.display())]
    IsDirectory {
        /// Offending path
        path: PathBuf,
    },

    /// Executable path could not be determined
    #[error("when getting executable path: {0}")]
    ExePath(#[source] std::io::Error),

    /// Working directory could not be changed
    #[error("when changing to executable path: {0}")]
    WorkingDir(#[source] std::io::Error),

    /// Sending a control to the service failed
    #[error("could not send control={control}: {message}")]
    ControlSend {
        /// Control that was sent
        control: String,
        /// Backend error message
        message: String,
    },

    /// Querying the service status failed
    #[error("could not retrieve service status: {0}")]
    StatusQuery(String),

    /// The service did not reach the expected state in time
    #[error("timeout waiting for service to go to state={state}")]
    Timeout {
        /// Expected state
        state: State,
    },

    /// Reporting a status change failed
    #[error("could not report service status: {0}")]
    StatusReport(String),

    /// Writing to the event log failed
    #[error("event log error: {0}")]
    EventLog(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a control send error
    pub fn control_send(control: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        Self::ControlSend {
            control: control.to_string(),
            message: message.to_string(),
        }
    }
}
