//! Windows service control manager bindings
//!
//! Built on the `windows-service` crate for the SCM and on `winapi` /
//! `winreg` for the event log.

mod dispatcher;
mod eventlog;
mod manager;

pub use dispatcher::dispatch;
pub use eventlog::{install_event_source, remove_event_source, WindowsEventLog};
pub use manager::{control_service, install_service, query_state, remove_service, start_service};

use std::error::Error as _;
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use svchelper_core::config::StartType;
use svchelper_core::{Accepted, ExitCode, State};
use windows_service::service::{
    ServiceControlAccept, ServiceExitCode, ServiceStartType, ServiceState,
};

/// Error text including the underlying OS error
pub(crate) fn describe(err: windows_service::Error) -> String {
    match err.source() {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

/// Nul-terminated UTF-16 copy of `value`
pub(crate) fn to_wide(value: &str) -> Vec<u16> {
    OsStr::new(value)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

pub(crate) fn state_from_scm(state: ServiceState) -> State {
    match state {
        ServiceState::Stopped => State::Stopped,
        ServiceState::StartPending => State::StartPending,
        ServiceState::StopPending => State::StopPending,
        ServiceState::Running => State::Running,
        ServiceState::ContinuePending => State::ContinuePending,
        ServiceState::PausePending => State::PausePending,
        ServiceState::Paused => State::Paused,
    }
}

pub(crate) fn state_to_scm(state: State) -> ServiceState {
    match state {
        State::Stopped => ServiceState::Stopped,
        State::StartPending => ServiceState::StartPending,
        State::StopPending => ServiceState::StopPending,
        State::Running => ServiceState::Running,
        State::ContinuePending => ServiceState::ContinuePending,
        State::PausePending => ServiceState::PausePending,
        State::Paused => ServiceState::Paused,
    }
}

pub(crate) fn accepts_to_scm(accepts: Accepted) -> ServiceControlAccept {
    let mut scm = ServiceControlAccept::empty();
    if accepts.contains(Accepted::STOP) {
        scm |= ServiceControlAccept::STOP;
    }
    if accepts.contains(Accepted::SHUTDOWN) {
        scm |= ServiceControlAccept::SHUTDOWN;
    }
    if accepts.contains(Accepted::PAUSE_CONTINUE) {
        scm |= ServiceControlAccept::PAUSE_CONTINUE;
    }
    scm
}

pub(crate) fn exit_code_to_scm(code: ExitCode) -> ServiceExitCode {
    match code {
        ExitCode::Win32(code) => ServiceExitCode::Win32(code),
        ExitCode::ServiceSpecific(code) => ServiceExitCode::ServiceSpecific(code),
    }
}

pub(crate) fn start_type_to_scm(start_type: StartType) -> ServiceStartType {
    match start_type {
        StartType::Automatic => ServiceStartType::AutoStart,
        StartType::Manual => ServiceStartType::OnDemand,
        StartType::Disabled => ServiceStartType::Disabled,
    }
}
