//! svchelper demo
//!
//! A heartbeat task wrapped as a Windows service. Run `debug` to try it in
//! the foreground on any platform.

mod args;
mod config;
mod heartbeat;
mod logging;

use anyhow::Result;
use colored::Colorize;
use svchelper_core::paths;
use svchelper_service::{ServiceCommand, ServiceWrapper};
use tracing::{debug, error};

use args::Args;
use config::DemoConfig;
use heartbeat::HeartbeatService;

fn main() -> Result<()> {
    let args = Args::parse_normalized();

    let _log_guard = logging::init(&args)?;

    let result = run(args);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(args: Args) -> Result<()> {
    let exe = paths::exe_path().ok();
    let config = DemoConfig::resolve(args.config.as_deref(), exe.as_deref())?;
    debug!(name = %config.service.name, ?args.command, "Configuration loaded");

    let service = HeartbeatService::new(config.heartbeat.clone());
    let wrapper = ServiceWrapper::new(service, config.service)?;

    match wrapper.manage(args.command) {
        Err(e) => match e.downcast_ref::<svchelper_service::UsageError>() {
            Some(usage) => usage.exit(),
            None => Err(e),
        },
        Ok(()) => {
            if let Some(cmd) = args.command {
                println!("{}", format!("{} {} done", cmd, wrapper.name()).green());
                if cmd.control().is_some() || cmd == ServiceCommand::Start {
                    match wrapper.query_state() {
                        Ok(state) => println!("state: {}", state.to_string().cyan()),
                        Err(e) => debug!(error = %e, "Could not query the service state"),
                    }
                }
            }
            Ok(())
        }
    }
}
