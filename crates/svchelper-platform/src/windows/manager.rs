//! Service registration and control through the SCM

use std::ffi::OsString;
use std::path::Path;

use svchelper_core::{control_and_wait, Control, ControlHandle, ServiceConfig, State, WaitOptions};
use tracing::{debug, info, warn};
use windows_service::service::{
    Service, ServiceAccess, ServiceErrorControl, ServiceInfo, ServiceType,
};
use windows_service::service_manager::{ServiceManager, ServiceManagerAccess};

use super::{describe, eventlog, start_type_to_scm, state_from_scm};
use crate::error::{PlatformError, Result};

fn connect(access: ServiceManagerAccess) -> Result<ServiceManager> {
    ServiceManager::local_computer(None::<&str>, access)
        .map_err(|e| PlatformError::Connect(describe(e)))
}

/// Register the service and its event-log source
///
/// The registration is rolled back when the event-log source cannot be
/// created.
pub fn install_service(config: &ServiceConfig, exe_path: &Path) -> Result<()> {
    let manager = connect(ServiceManagerAccess::CONNECT | ServiceManagerAccess::CREATE_SERVICE)?;

    if manager
        .open_service(&config.name, ServiceAccess::QUERY_STATUS)
        .is_ok()
    {
        return Err(PlatformError::AlreadyExists(config.name.clone()));
    }

    let service_info = ServiceInfo {
        name: OsString::from(&config.name),
        display_name: OsString::from(config.effective_display_name()),
        service_type: ServiceType::OWN_PROCESS,
        start_type: start_type_to_scm(config.start_type),
        error_control: ServiceErrorControl::Normal,
        executable_path: exe_path.to_path_buf(),
        launch_arguments: config.launch_arguments.iter().map(OsString::from).collect(),
        dependencies: vec![],
        account_name: None, // LocalSystem
        account_password: None,
    };
    debug!(
        name = %config.name,
        exe = %exe_path.display(),
        args = ?config.launch_arguments,
        "Creating service"
    );
    let service = manager
        .create_service(&service_info, ServiceAccess::CHANGE_CONFIG | ServiceAccess::DELETE)
        .map_err(|e| PlatformError::Create(describe(e)))?;

    if !config.description.is_empty() {
        if let Err(e) = service.set_description(&config.description) {
            rollback(&service, &config.name);
            return Err(PlatformError::Description(describe(e)));
        }
    }

    if let Err(e) = eventlog::install_event_source(&config.name, config.event_type_set()) {
        rollback(&service, &config.name);
        return Err(PlatformError::EventSourceSetup(e.to_string()));
    }

    info!(name = %config.name, "Service installed");
    Ok(())
}

fn rollback(service: &Service, name: &str) {
    if let Err(e) = service.delete() {
        warn!(name = %name, error = %describe(e), "Could not delete half-installed service");
    }
}

/// Delete the service and its event-log source
pub fn remove_service(name: &str) -> Result<()> {
    let manager = connect(ServiceManagerAccess::CONNECT)?;
    let service = manager
        .open_service(name, ServiceAccess::DELETE)
        .map_err(|_| PlatformError::NotInstalled(name.to_string()))?;

    service
        .delete()
        .map_err(|e| PlatformError::Delete(describe(e)))?;
    drop(service);

    eventlog::remove_event_source(name)
        .map_err(|e| PlatformError::EventSourceRemove(e.to_string()))?;

    info!(name = %name, "Service removed");
    Ok(())
}

/// Start the service with the given arguments
pub fn start_service(name: &str, args: &[String]) -> Result<()> {
    let manager = connect(ServiceManagerAccess::CONNECT)?;
    let service = manager
        .open_service(name, ServiceAccess::START)
        .map_err(|e| PlatformError::Access(describe(e)))?;

    service
        .start(args)
        .map_err(|e| PlatformError::Start(describe(e)))?;

    info!(name = %name, args = ?args, "Service start requested");
    Ok(())
}

/// Send `control` and wait for the service to reach the matching state
pub fn control_service(name: &str, control: Control, options: WaitOptions) -> Result<()> {
    let manager = connect(ServiceManagerAccess::CONNECT)?;
    let service = manager
        .open_service(
            name,
            ServiceAccess::QUERY_STATUS | ServiceAccess::STOP | ServiceAccess::PAUSE_CONTINUE,
        )
        .map_err(|e| PlatformError::Access(describe(e)))?;

    control_and_wait(&ScmHandle(service), control, options)?;
    info!(name = %name, %control, "Service reached {}", control.target_state());
    Ok(())
}

/// Current state of the service
pub fn query_state(name: &str) -> Result<State> {
    let manager = connect(ServiceManagerAccess::CONNECT)?;
    let service = manager
        .open_service(name, ServiceAccess::QUERY_STATUS)
        .map_err(|e| PlatformError::Access(describe(e)))?;

    ScmHandle(service)
        .query()
        .map_err(|e| PlatformError::Control(svchelper_core::Error::StatusQuery(e)))
}

struct ScmHandle(Service);

impl ControlHandle for ScmHandle {
    type Error = String;

    fn control(&self, control: Control) -> std::result::Result<State, String> {
        let status = match control {
            Control::Stop => self.0.stop(),
            Control::Pause => self.0.pause(),
            Control::Continue => self.0.resume(),
        }
        .map_err(describe)?;
        Ok(state_from_scm(status.current_state))
    }

    fn query(&self) -> std::result::Result<State, String> {
        let status = self.0.query_status().map_err(describe)?;
        Ok(state_from_scm(status.current_state))
    }
}
