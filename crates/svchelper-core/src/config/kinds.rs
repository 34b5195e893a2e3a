//! Enumerated configuration values

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// How the service control manager starts the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartType {
    /// Started at boot
    #[default]
    Automatic,
    /// Started on demand
    Manual,
    /// Cannot be started
    Disabled,
}

/// Kind of event-log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Error entries
    Error,
    /// Warning entries
    Warning,
    /// Informational entries
    Info,
}

bitflags! {
    /// Set of event types an event-log source supports
    ///
    /// Bit values follow the `EVENTLOG_*_TYPE` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventTypes: u32 {
        /// `EVENTLOG_ERROR_TYPE`
        const ERROR = 0x0001;
        /// `EVENTLOG_WARNING_TYPE`
        const WARNING = 0x0002;
        /// `EVENTLOG_INFORMATION_TYPE`
        const INFO = 0x0004;
    }
}

impl From<EventType> for EventTypes {
    fn from(kind: EventType) -> Self {
        match kind {
            EventType::Error => EventTypes::ERROR,
            EventType::Warning => EventTypes::WARNING,
            EventType::Info => EventTypes::INFO,
        }
    }
}

impl EventTypes {
    /// Collapse a list of event types into a set
    pub fn from_kinds(kinds: &[EventType]) -> Self {
        kinds
            .iter()
            .fold(EventTypes::empty(), |set, kind| set | EventTypes::from(*kind))
    }
}
