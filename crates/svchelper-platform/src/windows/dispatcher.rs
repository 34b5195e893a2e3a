//! Service control dispatcher bridge
//!
//! The SCM calls the generated `ffi_service_main` on its own thread. Control
//! events arrive on yet another thread through the registered handler, which
//! forwards them to [`Dispatcher::execute`] over a channel.

use std::ffi::OsString;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use svchelper_core::{
    ChangeRequest, Cmd, Dispatcher, EventLog, ExitCode, State, Status, StatusSink, StatusTracker,
};
use tokio::sync::mpsc;
use tracing::{debug, error};
use winapi::shared::winerror::ERROR_FAILED_SERVICE_CONTROLLER_CONNECT;
use windows_service::define_windows_service;
use windows_service::service::{ServiceControl, ServiceStatus, ServiceType};
use windows_service::service_control_handler::{
    self, ServiceControlHandlerResult, ServiceStatusHandle,
};
use windows_service::service_dispatcher;

use super::{accepts_to_scm, describe, exit_code_to_scm, state_to_scm};
use crate::error::{PlatformError, Result};
use crate::Dispatch;

const SERVICE_TYPE: ServiceType = ServiceType::OWN_PROCESS;

/// The dispatcher run by `service_main`; set once per process
static ACTIVE: OnceCell<Arc<Dispatcher>> = OnceCell::new();

define_windows_service!(ffi_service_main, service_main);

/// Hand the process to the service control dispatcher
///
/// Blocks until the service stopped. Returns [`Dispatch::Interactive`]
/// right away when the process was not started by the SCM.
pub fn dispatch(dispatcher: Arc<Dispatcher>) -> Result<Dispatch> {
    let name = dispatcher.name().to_string();
    ACTIVE
        .set(dispatcher)
        .map_err(|_| PlatformError::Dispatcher("already dispatched".to_string()))?;

    match service_dispatcher::start(&name, ffi_service_main) {
        Ok(()) => Ok(Dispatch::Service),
        Err(windows_service::Error::Winapi(e))
            if e.raw_os_error() == Some(ERROR_FAILED_SERVICE_CONTROLLER_CONNECT as i32) =>
        {
            debug!("Not started by the service control manager");
            Ok(Dispatch::Interactive)
        }
        Err(e) => Err(PlatformError::Dispatcher(describe(e))),
    }
}

fn service_main(arguments: Vec<OsString>) {
    let Some(dispatcher) = ACTIVE.get().cloned() else {
        return;
    };
    if let Err(e) = run(&dispatcher, arguments) {
        let msg = format!("{} service failed: {}", dispatcher.name(), e);
        if dispatcher.event_log().error(1, &msg).is_err() {
            error!("{}", msg);
        }
    }
}

fn run(dispatcher: &Dispatcher, arguments: Vec<OsString>) -> Result<()> {
    let args: Vec<String> = arguments
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let (tx, rx) = mpsc::unbounded_channel();
    let tracker_cell: Arc<OnceCell<Arc<StatusTracker>>> = Arc::new(OnceCell::new());

    let handler_tracker = tracker_cell.clone();
    let event_handler = move |control: ServiceControl| -> ServiceControlHandlerResult {
        let (cmd, result) = match control {
            ServiceControl::Interrogate => (Cmd::Interrogate, ServiceControlHandlerResult::NoError),
            ServiceControl::Stop => (Cmd::Stop, ServiceControlHandlerResult::NoError),
            ServiceControl::Shutdown => (Cmd::Shutdown, ServiceControlHandlerResult::NoError),
            ServiceControl::Pause => (Cmd::Pause, ServiceControlHandlerResult::NoError),
            ServiceControl::Continue => (Cmd::Continue, ServiceControlHandlerResult::NoError),
            other => (
                Cmd::Other(format!("{other:?}")),
                ServiceControlHandlerResult::NotImplemented,
            ),
        };
        let request = match handler_tracker.get() {
            Some(tracker) => tracker.request(cmd),
            None => ChangeRequest {
                cmd,
                current_status: Status::new(State::StartPending),
            },
        };
        if tx.send(request).is_err() {
            debug!("Control received after the service finished");
        }
        result
    };

    let status_handle = service_control_handler::register(dispatcher.name(), event_handler)
        .map_err(|e| PlatformError::Dispatcher(describe(e)))?;

    let sink = ScmStatusSink::new(status_handle);
    let tracker = Arc::new(StatusTracker::new(Box::new(sink.clone())));
    let _ = tracker_cell.set(tracker.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(format!("{}-worker", dispatcher.name()))
        .build()?;

    let code = runtime.block_on(dispatcher.execute(&args, rx, &tracker));
    runtime.shutdown_timeout(dispatcher.config().wait_hint());

    sink.stopped(code)
}

/// Status sink writing to the SCM
#[derive(Clone)]
struct ScmStatusSink {
    handle: ServiceStatusHandle,
    checkpoint: Arc<AtomicU32>,
}

impl ScmStatusSink {
    fn new(handle: ServiceStatusHandle) -> Self {
        Self {
            handle,
            checkpoint: Arc::new(AtomicU32::new(0)),
        }
    }

    fn stopped(&self, code: ExitCode) -> Result<()> {
        self.handle
            .set_service_status(ServiceStatus {
                service_type: SERVICE_TYPE,
                current_state: state_to_scm(State::Stopped),
                controls_accepted: accepts_to_scm(Default::default()),
                exit_code: exit_code_to_scm(code),
                checkpoint: 0,
                wait_hint: Default::default(),
                process_id: None,
            })
            .map_err(|e| PlatformError::Dispatcher(describe(e)))
    }
}

impl StatusSink for ScmStatusSink {
    fn set_status(&self, status: &Status) -> svchelper_core::Result<()> {
        let checkpoint = if status.state.is_pending() {
            self.checkpoint.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.checkpoint.store(0, Ordering::SeqCst);
            0
        };
        self.handle
            .set_service_status(ServiceStatus {
                service_type: SERVICE_TYPE,
                current_state: state_to_scm(status.state),
                controls_accepted: accepts_to_scm(status.accepts),
                exit_code: exit_code_to_scm(ExitCode::SUCCESS),
                checkpoint,
                wait_hint: status.wait_hint,
                process_id: None,
            })
            .map_err(|e| svchelper_core::Error::StatusReport(describe(e)))
    }
}
