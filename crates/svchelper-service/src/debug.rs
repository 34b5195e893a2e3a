//! Foreground runner
//!
//! Runs the dispatch loop in the current process without an SCM. Status
//! changes go to the log and Ctrl-C stands in for the stop control.

use std::sync::Arc;

use anyhow::{Context, Result};
use svchelper_core::{ChangeRequest, Cmd, Dispatcher, ExitCode, Status, StatusSink, StatusTracker};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

/// Status sink printing transitions to the log
#[derive(Debug, Clone)]
pub struct ConsoleStatus {
    service: String,
}

impl ConsoleStatus {
    /// Sink for the named service
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl StatusSink for ConsoleStatus {
    fn set_status(&self, status: &Status) -> svchelper_core::Result<()> {
        info!(
            service = %self.service,
            accepts = ?status.accepts,
            "Service state {}",
            status.state
        );
        Ok(())
    }
}

/// Run `dispatcher` until it ends or Ctrl-C is pressed
pub fn run(dispatcher: &Dispatcher, args: &[String]) -> Result<ExitCode> {
    let (tx, rx) = mpsc::unbounded_channel();
    let tracker = Arc::new(StatusTracker::new(Box::new(ConsoleStatus::new(
        dispatcher.name(),
    ))));

    let hook_tracker = tracker.clone();
    ctrlc::set_handler(move || {
        debug!("Interrupt received");
        if tx.send(hook_tracker.request(Cmd::Stop)).is_err() {
            debug!("Service already finished");
        }
    })
    .context("when installing the Ctrl-C handler")?;

    run_with_requests(dispatcher, args, rx, &tracker)
}

/// Run `dispatcher` on a fresh runtime, fed by `requests`
pub fn run_with_requests(
    dispatcher: &Dispatcher,
    args: &[String],
    requests: UnboundedReceiver<ChangeRequest>,
    status: &StatusTracker,
) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("when building the runtime")?;

    let code = runtime.block_on(dispatcher.execute(args, requests, status));
    runtime.shutdown_timeout(dispatcher.config().wait_hint());
    Ok(code)
}
