//! Service wrapper
//!
//! [`ServiceWrapper`] binds one [`Service`] implementation to its
//! [`ServiceConfig`] and exposes everything needed to install, control and
//! run it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use svchelper_core::{
    paths, ConsoleLog, Control, Dispatcher, EventLog, Service, ServiceConfig, State, TaskGroup,
    WaitOptions,
};
use svchelper_platform::{Dispatch, PlatformError, WindowsEventLog};
use tracing::{debug, info};

use crate::command::{ManageArgs, ServiceCommand, UsageError};
use crate::debug;

const EVENT_ID: u32 = 1;

/// A task wrapped as a controllable service
pub struct ServiceWrapper {
    service: Arc<dyn Service>,
    config: Arc<ServiceConfig>,
}

impl ServiceWrapper {
    /// Wrap `service`
    ///
    /// Validates `config` and, when asked to, makes the executable's
    /// directory the working directory.
    pub fn new<S: Service>(service: S, config: ServiceConfig) -> Result<Self> {
        config.validate().context("invalid service configuration")?;
        if config.use_exe_dir_as_working_dir {
            paths::set_exe_dir_as_working_dir().context("when changing working directory")?;
        }
        Ok(Self {
            service: Arc::new(service),
            config: Arc::new(config),
        })
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Absolute path of the running executable
    pub fn exe_path(&self) -> Result<PathBuf> {
        Ok(paths::exe_path()?)
    }

    /// Register the running executable as the service
    pub fn install_service(&self) -> Result<()> {
        let exe = self.exe_path()?;
        svchelper_platform::install_service(&self.config, &exe)?;
        Ok(())
    }

    /// Unregister the service
    pub fn remove_service(&self) -> Result<()> {
        svchelper_platform::remove_service(self.name())?;
        Ok(())
    }

    /// Start the installed service with the configured start arguments
    pub fn start_service(&self) -> Result<()> {
        svchelper_platform::start_service(self.name(), &self.config.start_arguments)?;
        Ok(())
    }

    /// Send `control` and wait for the matching state
    pub fn control_service(&self, control: Control) -> Result<()> {
        let options = WaitOptions {
            timeout: self.config.control_timeout(),
            poll_interval: self.config.poll_interval(),
        };
        svchelper_platform::control_service(self.name(), control, options)?;
        Ok(())
    }

    /// Current state of the installed service
    pub fn query_state(&self) -> Result<State> {
        Ok(svchelper_platform::query_state(self.name())?)
    }

    /// Run the service, in the foreground when `is_debug` is set
    pub fn run_service(&self, is_debug: bool) -> Result<()> {
        let elog = self.open_event_log(is_debug)?;
        let dispatcher = self.dispatcher(elog.clone());

        let result = if is_debug {
            let code = debug::run(&dispatcher, &[self.config.name.clone()])?;
            if code.is_success() {
                Ok(Dispatch::Service)
            } else {
                Err(anyhow!("exited with {code:?}"))
            }
        } else {
            svchelper_platform::dispatch(Arc::new(dispatcher)).map_err(Into::into)
        };

        match result {
            Ok(Dispatch::Service) => {
                log(elog.info(EVENT_ID, &format!("{} service stopped", self.name())));
                Ok(())
            }
            Ok(Dispatch::Interactive) => Err(anyhow!(
                "{} was not started by the service control manager",
                self.name()
            )),
            Err(e) => {
                log(elog.error(EVENT_ID, &format!("{} service failed: {:#}", self.name(), e)));
                Err(e)
            }
        }
    }

    /// Run one management verb
    pub fn execute_command(&self, cmd: ServiceCommand) -> Result<()> {
        debug!(name = %self.name(), %cmd, "Executing command");
        let result = match cmd {
            ServiceCommand::Debug => self.run_service(true),
            ServiceCommand::Install => self.install_service(),
            ServiceCommand::Remove => self.remove_service(),
            ServiceCommand::Start => self.start_service(),
            ServiceCommand::Stop => self.control_service(Control::Stop),
            ServiceCommand::Pause => self.control_service(Control::Pause),
            ServiceCommand::Continue => self.control_service(Control::Continue),
        };
        result.with_context(|| format!("failed to {} {}", cmd, self.name()))
    }

    /// Run `cmd`, or serve the SCM when no command is given
    ///
    /// Without a command an interactive process fails with a [`UsageError`].
    pub fn manage(&self, cmd: Option<ServiceCommand>) -> Result<()> {
        match cmd {
            Some(cmd) => self.execute_command(cmd),
            None => match self.serve()? {
                Dispatch::Service => Ok(()),
                Dispatch::Interactive => Err(UsageError::new("no command specified").into()),
            },
        }
    }

    /// Manage the service from the process arguments
    ///
    /// Usage errors print the usage text and exit with status 2.
    pub fn manage_service(&self) -> Result<()> {
        let args = ManageArgs::from_env();
        let cmd = match args.command() {
            Ok(cmd) => cmd,
            Err(usage) => usage.exit(),
        };
        match self.manage(cmd) {
            Err(e) => match e.downcast_ref::<UsageError>() {
                Some(usage) => args.usage_error(usage.message()).exit(),
                None => Err(e),
            },
            ok => ok,
        }
    }

    fn serve(&self) -> Result<Dispatch> {
        let elog = self.open_event_log(false)?;
        let dispatch = svchelper_platform::dispatch(Arc::new(self.dispatcher(elog.clone())));
        match &dispatch {
            Ok(Dispatch::Service) => {
                log(elog.info(EVENT_ID, &format!("{} service stopped", self.name())));
            }
            Ok(Dispatch::Interactive) => {}
            Err(e) => {
                log(elog.error(EVENT_ID, &format!("{} service failed: {}", self.name(), e)));
            }
        }
        Ok(dispatch?)
    }

    fn open_event_log(&self, is_debug: bool) -> Result<Arc<dyn EventLog>> {
        if is_debug {
            return Ok(Arc::new(ConsoleLog::new(self.name())));
        }
        match WindowsEventLog::open(self.name()) {
            Ok(elog) => Ok(Arc::new(elog)),
            Err(PlatformError::Unsupported(_)) => Ok(Arc::new(ConsoleLog::new(self.name()))),
            Err(e) => Err(e).context("when opening the eventlog"),
        }
    }

    fn dispatcher(&self, elog: Arc<dyn EventLog>) -> Dispatcher {
        let service = Arc::new(Announced {
            inner: self.service.clone(),
            name: self.config.name.clone(),
            elog: elog.clone(),
        });
        Dispatcher::new(service, self.config.clone(), elog)
    }
}

/// Logs the start message once the service is scheduled
struct Announced {
    inner: Arc<dyn Service>,
    name: String,
    elog: Arc<dyn EventLog>,
}

impl Service for Announced {
    fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
        log(self.elog.info(EVENT_ID, &format!("starting {} service", self.name)));
        self.inner.schedule(tasks)
    }

    fn pause(&self) -> anyhow::Result<()> {
        self.inner.pause()
    }

    fn resume(&self) -> anyhow::Result<()> {
        self.inner.resume()
    }
}

fn log(result: svchelper_core::Result<()>) {
    if let Err(e) = result {
        info!(error = %e, "Event log write failed");
    }
}
