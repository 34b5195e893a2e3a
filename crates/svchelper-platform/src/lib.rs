//! svchelper Platform Layer
//!
//! This crate talks to the operating system's service facilities.
//!
//! ## Supported Platforms
//!
//! - **Windows**: Service Control Manager and the Application event log
//! - **Other**: every operation fails with [`PlatformError::Unsupported`];
//!   the dispatcher reports an interactive process so debug mode still works

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub use error::{PlatformError, Result};

#[cfg(windows)]
pub mod windows;

#[cfg(windows)]
pub use windows::{
    control_service, dispatch, install_event_source, install_service, query_state,
    remove_event_source, remove_service, start_service, WindowsEventLog,
};

#[cfg(not(windows))]
mod unsupported;

#[cfg(not(windows))]
pub use unsupported::{
    control_service, dispatch, install_event_source, install_service, query_state,
    remove_event_source, remove_service, start_service, WindowsEventLog,
};

/// Outcome of handing the process to the service control dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The process ran as a service, which has now stopped
    Service,
    /// The process was not started by the service control manager
    Interactive,
}
