//! Service status model
//!
//! States, accepted controls and commands exchanged with the service control
//! manager, independent of the OS binding that carries them.

use std::fmt;
use std::time::Duration;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::error::Result;

/// Lifecycle state of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Not running
    Stopped,
    /// Starting, not yet accepting controls
    StartPending,
    /// Stopping
    StopPending,
    /// Running
    Running,
    /// Resuming from pause
    ContinuePending,
    /// Pausing
    PausePending,
    /// Paused
    Paused,
}

impl State {
    /// Whether this is one of the transitional `*Pending` states
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            State::StartPending | State::StopPending | State::ContinuePending | State::PausePending
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Stopped => "Stopped",
            State::StartPending => "StartPending",
            State::StopPending => "StopPending",
            State::Running => "Running",
            State::ContinuePending => "ContinuePending",
            State::PausePending => "PausePending",
            State::Paused => "Paused",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Controls a running service accepts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Accepted: u32 {
        /// Stop requests
        const STOP = 0x1;
        /// System shutdown notifications
        const SHUTDOWN = 0x2;
        /// Pause and continue requests
        const PAUSE_CONTINUE = 0x4;
    }
}

/// A status report sent to the service control manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Current state
    pub state: State,
    /// Controls accepted in this state
    pub accepts: Accepted,
    /// Progress counter for pending states
    pub checkpoint: u32,
    /// Expected time until the next report for pending states
    pub wait_hint: Duration,
}

impl Status {
    /// Status in the given state accepting nothing
    pub fn new(state: State) -> Self {
        Self {
            state,
            accepts: Accepted::empty(),
            checkpoint: 0,
            wait_hint: Duration::ZERO,
        }
    }

    /// Running status accepting the given controls
    pub fn running(accepts: Accepted) -> Self {
        Self {
            accepts,
            ..Self::new(State::Running)
        }
    }

    /// Pending status with a wait hint
    pub fn pending(state: State, wait_hint: Duration) -> Self {
        Self {
            wait_hint,
            ..Self::new(state)
        }
    }

    /// Same status with different accepted controls
    pub fn with_accepts(mut self, accepts: Accepted) -> Self {
        self.accepts = accepts;
        self
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new(State::Stopped)
    }
}

/// A command received from the service control manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Stop the service
    Stop,
    /// Pause the service
    Pause,
    /// Continue a paused service
    Continue,
    /// Report the current status again
    Interrogate,
    /// The system is shutting down
    Shutdown,
    /// Any other control, by name
    Other(String),
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Stop => f.write_str("Stop"),
            Cmd::Pause => f.write_str("Pause"),
            Cmd::Continue => f.write_str("Continue"),
            Cmd::Interrogate => f.write_str("Interrogate"),
            Cmd::Shutdown => f.write_str("Shutdown"),
            Cmd::Other(name) => f.write_str(name),
        }
    }
}

/// A control a controller process sends to an installed service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Stop the service
    Stop,
    /// Pause the service
    Pause,
    /// Continue the service
    Continue,
}

impl Control {
    /// State the service is expected to reach after this control
    pub fn target_state(&self) -> State {
        match self {
            Control::Stop => State::Stopped,
            Control::Pause => State::Paused,
            Control::Continue => State::Running,
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Stop => f.write_str("stop"),
            Control::Pause => f.write_str("pause"),
            Control::Continue => f.write_str("continue"),
        }
    }
}

/// One command together with the last status reported before it arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    /// The command
    pub cmd: Cmd,
    /// Status at the time the command was received
    pub current_status: Status,
}

/// Exit code reported with the final `Stopped` status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// A Win32 error code
    Win32(u32),
    /// A service specific error code
    ServiceSpecific(u32),
}

impl ExitCode {
    /// Clean exit
    pub const SUCCESS: ExitCode = ExitCode::Win32(0);

    /// Whether the service exited cleanly
    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

/// Destination of status reports
#[cfg_attr(test, mockall::automock)]
pub trait StatusSink: Send + Sync {
    /// Publish a status change
    fn set_status(&self, status: &Status) -> Result<()>;
}

/// Remembers the last status sent through a sink
pub struct StatusTracker {
    sink: Box<dyn StatusSink>,
    current: Mutex<Status>,
}

impl StatusTracker {
    /// Wrap a sink; the initial status is `Stopped`
    pub fn new(sink: Box<dyn StatusSink>) -> Self {
        Self {
            sink,
            current: Mutex::new(Status::default()),
        }
    }

    /// Send a status and remember it
    ///
    /// The status is remembered even when the sink fails, so the next
    /// transition starts from the intended state.
    pub fn report(&self, status: Status) -> Result<()> {
        let mut current = self.current.lock();
        let sent = self.sink.set_status(&status);
        *current = status;
        sent
    }

    /// Last status reported
    pub fn current(&self) -> Status {
        self.current.lock().clone()
    }

    /// Build a request for a command received now
    pub fn request(&self, cmd: Cmd) -> ChangeRequest {
        ChangeRequest {
            cmd,
            current_status: self.current(),
        }
    }
}
