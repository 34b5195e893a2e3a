//! Service event log
//!
//! Entries carry an event id; the Windows event log shows it next to the
//! message. In debug mode the console log stands in for it.

use tracing::{error, info, warn};

use crate::error::Result;

/// Sink for service lifecycle messages
#[cfg_attr(test, mockall::automock)]
pub trait EventLog: Send + Sync {
    /// Informational entry
    fn info(&self, eid: u32, msg: &str) -> Result<()>;

    /// Warning entry
    fn warning(&self, eid: u32, msg: &str) -> Result<()>;

    /// Error entry
    fn error(&self, eid: u32, msg: &str) -> Result<()>;
}

/// Event log writing through `tracing`
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    service: String,
}

impl ConsoleLog {
    /// Log for the named service
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl EventLog for ConsoleLog {
    fn info(&self, eid: u32, msg: &str) -> Result<()> {
        info!(service = %self.service, event_id = eid, "{}", msg);
        Ok(())
    }

    fn warning(&self, eid: u32, msg: &str) -> Result<()> {
        warn!(service = %self.service, event_id = eid, "{}", msg);
        Ok(())
    }

    fn error(&self, eid: u32, msg: &str) -> Result<()> {
        error!(service = %self.service, event_id = eid, "{}", msg);
        Ok(())
    }
}
