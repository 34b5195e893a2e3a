//! Stand-ins for platforms without a service control manager

use std::path::Path;
use std::sync::Arc;

use svchelper_core::config::EventTypes;
use svchelper_core::{Control, Dispatcher, EventLog, ServiceConfig, State, WaitOptions};
use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::Dispatch;

/// Always reports an interactive process
pub fn dispatch(dispatcher: Arc<Dispatcher>) -> Result<Dispatch> {
    debug!(name = %dispatcher.name(), "No service control manager on this platform");
    Ok(Dispatch::Interactive)
}

/// Not supported
pub fn install_service(_config: &ServiceConfig, _exe_path: &Path) -> Result<()> {
    Err(PlatformError::Unsupported("service installation"))
}

/// Not supported
pub fn remove_service(_name: &str) -> Result<()> {
    Err(PlatformError::Unsupported("service removal"))
}

/// Not supported
pub fn start_service(_name: &str, _args: &[String]) -> Result<()> {
    Err(PlatformError::Unsupported("service start"))
}

/// Not supported
pub fn control_service(_name: &str, _control: Control, _options: WaitOptions) -> Result<()> {
    Err(PlatformError::Unsupported("service control"))
}

/// Not supported
pub fn query_state(_name: &str) -> Result<State> {
    Err(PlatformError::Unsupported("service status query"))
}

/// Not supported
pub fn install_event_source(_source: &str, _types: EventTypes) -> Result<()> {
    Err(PlatformError::Unsupported("event log"))
}

/// Not supported
pub fn remove_event_source(_source: &str) -> Result<()> {
    Err(PlatformError::Unsupported("event log"))
}

/// Event log that cannot be opened on this platform
#[derive(Debug)]
pub struct WindowsEventLog {
    _private: (),
}

impl WindowsEventLog {
    /// Always fails
    pub fn open(_source: &str) -> Result<Self> {
        Err(PlatformError::Unsupported("event log"))
    }
}

impl EventLog for WindowsEventLog {
    fn info(&self, _eid: u32, _msg: &str) -> svchelper_core::Result<()> {
        Err(svchelper_core::Error::EventLog("unsupported".to_string()))
    }

    fn warning(&self, _eid: u32, _msg: &str) -> svchelper_core::Result<()> {
        Err(svchelper_core::Error::EventLog("unsupported".to_string()))
    }

    fn error(&self, _eid: u32, _msg: &str) -> svchelper_core::Result<()> {
        Err(svchelper_core::Error::EventLog("unsupported".to_string()))
    }
}
