//! # svchelper Service
//!
//! Wraps a [`Service`](svchelper_core::Service) so one executable can
//! install, control and run itself as a Windows service:
//!
//! ```text
//! prog install | remove | start | stop | pause | continue | debug
//! ```
//!
//! Started by the service control manager without a command, the same
//! executable serves the SCM.
//!
//! ```rust,no_run
//! use svchelper_core::{Service, ServiceConfig, TaskGroup};
//! use svchelper_service::ServiceWrapper;
//!
//! struct Idle;
//!
//! impl Service for Idle {
//!     fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
//!         let token = tasks.token();
//!         tasks.spawn("idle", async move {
//!             token.cancelled().await;
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::new("idle", "Idle", "Does nothing", true);
//!     ServiceWrapper::new(Idle, config)?.manage_service()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod debug;
mod wrapper;

pub use command::{ManageArgs, ServiceCommand, UsageError};
pub use wrapper::ServiceWrapper;
