//! # svchelper Core
//!
//! Platform-independent core library for running a program as a service.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Configuration** - what the wrapper registers and how it waits
//! - **Status model** - states, accepted controls and commands
//! - **Task group** - the wrapped work and its shared cancellation
//! - **Dispatch loop** - the service control protocol around a task
//! - **Control wait** - fixed-timeout polling for a state transition
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use svchelper_core::{ConsoleLog, Dispatcher, Service, ServiceConfig, TaskGroup};
//!
//! struct Worker;
//!
//! impl Service for Worker {
//!     fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
//!         let token = tasks.token();
//!         tasks.spawn("worker", async move {
//!             token.cancelled().await;
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//! }
//!
//! let config = Arc::new(ServiceConfig::new("worker", "Worker", "Does work", false));
//! let dispatcher = Dispatcher::new(Arc::new(Worker), config, Arc::new(ConsoleLog::new("worker")));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod control;
pub mod dispatch;
pub mod elog;
pub mod error;
pub mod paths;
pub mod status;
pub mod task;

// Re-exports for convenience
pub use config::ServiceConfig;
pub use control::{control_and_wait, ControlHandle, WaitOptions};
pub use dispatch::Dispatcher;
pub use elog::{ConsoleLog, EventLog};
pub use error::{Error, Result};
pub use status::{Accepted, ChangeRequest, Cmd, Control, ExitCode, State, Status, StatusSink, StatusTracker};
pub use task::{Service, TaskFailure, TaskGroup};
