//! Service control command loop
//!
//! [`Dispatcher::execute`] is what the service control manager runs once the
//! service process is up. It reports every state transition through a
//! [`StatusTracker`] while the wrapped [`Service`] works on its task group,
//! and turns stop and shutdown commands into cancellation of that group.
//!
//! Reported sequence on a normal run:
//!
//! ```text
//! StartPending -> Running [-> PausePending -> Paused -> ContinuePending -> Running]* -> StopPending
//! ```
//!
//! The caller reports the final `Stopped` status with the returned exit code.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::elog::EventLog;
use crate::status::{Accepted, ChangeRequest, Cmd, ExitCode, State, Status, StatusTracker};
use crate::task::{Service, TaskGroup};

/// Event id used for every entry the dispatcher writes
const EVENT_ID: u32 = 1;

/// Runs a [`Service`] under the service control protocol
pub struct Dispatcher {
    service: Arc<dyn Service>,
    config: Arc<ServiceConfig>,
    elog: Arc<dyn EventLog>,
}

impl Dispatcher {
    /// Create a dispatcher for `service`
    pub fn new(service: Arc<dyn Service>, config: Arc<ServiceConfig>, elog: Arc<dyn EventLog>) -> Self {
        Self {
            service,
            config,
            elog,
        }
    }

    /// Name of the dispatched service
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration of the dispatched service
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The event log entries are written to
    pub fn event_log(&self) -> &Arc<dyn EventLog> {
        &self.elog
    }

    /// Run the service until it is stopped or ends by itself
    ///
    /// Returns once every task of the service has finished. A closed request
    /// channel is treated like a stop command.
    pub async fn execute(
        &self,
        args: &[String],
        mut requests: UnboundedReceiver<ChangeRequest>,
        status: &StatusTracker,
    ) -> ExitCode {
        let wait_hint = self.config.wait_hint();
        let accepts = self.config.accepted_controls();

        self.report(status, Status::pending(State::StartPending, wait_hint));

        let group = TaskGroup::new();
        if let Err(e) = self.service.schedule(&group) {
            self.log_error(&format!(
                "When scheduling the service '{}': {:#}",
                self.config.name, e
            ));
            group.cancel();
            self.join(&group).await;
            return ExitCode::Win32(1);
        }
        debug!(service = %self.config.name, tasks = group.len(), "Service scheduled");

        self.report(status, Status::running(accepts));

        loop {
            tokio::select! {
                _ = group.cancelled() => {
                    self.log_info("The wrapped service cancelled the execution");
                    break;
                }
                request = requests.recv() => {
                    let Some(request) = request else {
                        debug!(service = %self.config.name, "Control channel closed, stopping");
                        break;
                    };
                    match request.cmd {
                        Cmd::Interrogate => {
                            self.report(status, request.current_status);
                        }
                        cmd @ (Cmd::Stop | Cmd::Shutdown) => {
                            self.log_info(&stop_message(args, &cmd));
                            break;
                        }
                        Cmd::Pause if accepts.contains(Accepted::PAUSE_CONTINUE) => {
                            self.pause(status);
                        }
                        Cmd::Continue if accepts.contains(Accepted::PAUSE_CONTINUE) => {
                            self.resume(status);
                        }
                        other => {
                            self.log_error(&format!("unexpected control request #{other}"));
                        }
                    }
                }
            }
        }

        self.report(status, Status::pending(State::StopPending, wait_hint));
        group.cancel();
        self.join(&group).await;
        info!(service = %self.config.name, "All service tasks finished");
        ExitCode::SUCCESS
    }

    fn pause(&self, status: &StatusTracker) {
        let current = status.current();
        if current.state != State::Running {
            self.report(status, current);
            return;
        }
        let accepts = current.accepts;
        self.report(status, Status::pending(State::PausePending, self.config.wait_hint()));
        match self.service.pause() {
            Ok(()) => self.report(status, Status::new(State::Paused).with_accepts(accepts)),
            Err(e) => {
                self.log_error(&format!("pausing the service '{}' failed: {:#}", self.config.name, e));
                self.report(status, Status::running(accepts));
            }
        }
    }

    fn resume(&self, status: &StatusTracker) {
        let current = status.current();
        if current.state != State::Paused {
            self.report(status, current);
            return;
        }
        let accepts = current.accepts;
        self.report(status, Status::pending(State::ContinuePending, self.config.wait_hint()));
        match self.service.resume() {
            Ok(()) => self.report(status, Status::running(accepts)),
            Err(e) => {
                self.log_error(&format!("continuing the service '{}' failed: {:#}", self.config.name, e));
                self.report(status, Status::new(State::Paused).with_accepts(accepts));
            }
        }
    }

    async fn join(&self, group: &TaskGroup) {
        for failure in group.wait().await {
            self.log_warning(&format!("task '{}' failed: {}", failure.name, failure.message));
        }
    }

    fn report(&self, status: &StatusTracker, next: Status) {
        let state = next.state;
        if let Err(e) = status.report(next) {
            self.log_warning(&format!("reporting state {state} failed: {e}"));
        }
    }

    fn log_info(&self, msg: &str) {
        if let Err(e) = self.elog.info(EVENT_ID, msg) {
            tracing::warn!(error = %e, "{}", msg);
        }
    }

    fn log_warning(&self, msg: &str) {
        if let Err(e) = self.elog.warning(EVENT_ID, msg) {
            tracing::warn!(error = %e, "{}", msg);
        }
    }

    fn log_error(&self, msg: &str) {
        if let Err(e) = self.elog.error(EVENT_ID, msg) {
            tracing::error!(error = %e, "{}", msg);
        }
    }
}

/// Service arguments joined by `-`, followed by the command
fn stop_message(args: &[String], cmd: &Cmd) -> String {
    let mut message = args.join("-");
    message.push('-');
    message.push_str(&cmd.to_string());
    message
}
