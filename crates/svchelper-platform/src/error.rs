//! Platform-specific errors

use thiserror::Error;

/// Platform-specific errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Connecting to the service control manager failed
    #[error("could not connect to service manager: {0}")]
    Connect(String),

    /// A service with that name is already registered
    #[error("service {0} already exists")]
    AlreadyExists(String),

    /// No service with that name is registered
    #[error("service {0} is not installed")]
    NotInstalled(String),

    /// Opening the service failed
    #[error("could not access service: {0}")]
    Access(String),

    /// Creating the service failed
    #[error("could not create service: {0}")]
    Create(String),

    /// Setting the service description failed
    #[error("could not set service description: {0}")]
    Description(String),

    /// Deleting the service failed
    #[error("could not delete service: {0}")]
    Delete(String),

    /// Starting the service failed
    #[error("could not start service: {0}")]
    Start(String),

    /// Registering the event-log source failed
    #[error("SetupEventLogSource() failed: {0}")]
    EventSourceSetup(String),

    /// Removing the event-log source failed
    #[error("RemoveEventLogSource() failed: {0}")]
    EventSourceRemove(String),

    /// Event log error
    #[error("event log error: {0}")]
    EventLog(String),

    /// Handing the process to the service control dispatcher failed
    #[error("service dispatcher failed: {0}")]
    Dispatcher(String),

    /// Control or wait failure
    #[error(transparent)]
    Control(#[from] svchelper_core::Error),

    /// Operation not available on this platform
    #[error("{0} is only supported on Windows")]
    Unsupported(&'static str),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Platform result type
pub type Result<T> = std::result::Result<T, PlatformError>;
