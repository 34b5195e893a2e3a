//! Management verbs

use std::fmt;
use std::str::FromStr;

use clap::Subcommand;
use svchelper_core::Control;

/// Verb list printed with every usage error
pub const VERBS: &str = "install, remove, debug, start, stop, pause or continue";

/// Service management commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCommand {
    /// Register the service and its event-log source
    Install,

    /// Delete the service and its event-log source
    Remove,

    /// Start the installed service
    Start,

    /// Stop the service and wait until it stopped
    Stop,

    /// Pause the service and wait until it paused
    Pause,

    /// Continue a paused service and wait until it runs
    Continue,

    /// Run the service in the foreground
    Debug,
}

impl ServiceCommand {
    /// All verbs in usage order
    pub const ALL: [ServiceCommand; 7] = [
        ServiceCommand::Install,
        ServiceCommand::Remove,
        ServiceCommand::Debug,
        ServiceCommand::Start,
        ServiceCommand::Stop,
        ServiceCommand::Pause,
        ServiceCommand::Continue,
    ];

    /// Lowercase verb as typed on the command line
    pub fn verb(&self) -> &'static str {
        match self {
            ServiceCommand::Install => "install",
            ServiceCommand::Remove => "remove",
            ServiceCommand::Start => "start",
            ServiceCommand::Stop => "stop",
            ServiceCommand::Pause => "pause",
            ServiceCommand::Continue => "continue",
            ServiceCommand::Debug => "debug",
        }
    }

    /// Control sent to the running service, for the controlling verbs
    pub fn control(&self) -> Option<Control> {
        match self {
            ServiceCommand::Stop => Some(Control::Stop),
            ServiceCommand::Pause => Some(Control::Pause),
            ServiceCommand::Continue => Some(Control::Continue),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

impl FromStr for ServiceCommand {
    type Err = UsageError;

    /// Case insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.verb() == lower)
            .ok_or_else(|| UsageError::new(format!("invalid command {lower}")))
    }
}

/// Bad or missing command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UsageError {
    message: String,
    prog: String,
}

impl UsageError {
    /// Usage error with the program name taken from `argv[0]`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            prog: std::env::args().next().unwrap_or_else(|| "service".to_string()),
        }
    }

    /// Override the program name shown in the usage text
    pub fn with_prog(mut self, prog: impl Into<String>) -> Self {
        self.prog = prog.into();
        self
    }

    /// The error message alone
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message followed by the usage text
    pub fn usage(&self) -> String {
        format!(
            "{}\n\nusage: {} <command>\n       where <command> is one of\n       {}.\n",
            self.message, self.prog, VERBS
        )
    }

    /// Print the usage text to stderr and exit with status 2
    pub fn exit(&self) -> ! {
        eprint!("{}", self.usage());
        std::process::exit(2)
    }
}

/// Stand-alone command line of a wrapped service: `<prog> [<command>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageArgs {
    prog: String,
    command: Option<String>,
}

impl ManageArgs {
    /// Parse the process arguments
    pub fn from_env() -> Self {
        Self::from_args(std::env::args())
    }

    /// Parse an argument list whose first item is the program name
    ///
    /// Arguments after the command are ignored.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let prog = args.next().unwrap_or_else(|| "service".to_string());
        Self {
            prog,
            command: args.next(),
        }
    }

    /// Program name
    pub fn prog(&self) -> &str {
        &self.prog
    }

    /// Whether a command was given at all
    pub fn has_command(&self) -> bool {
        self.command.is_some()
    }

    /// The parsed command
    ///
    /// `Ok(None)` when no command was given.
    pub fn command(&self) -> Result<Option<ServiceCommand>, UsageError> {
        match &self.command {
            None => Ok(None),
            Some(verb) => verb
                .parse()
                .map(Some)
                .map_err(|e: UsageError| e.with_prog(&self.prog)),
        }
    }

    /// Usage error for this program
    pub fn usage_error(&self, message: impl Into<String>) -> UsageError {
        UsageError::new(message).with_prog(&self.prog)
    }
}
