//! Controlling an installed service
//!
//! Sending stop, pause or continue only asks the service to change state;
//! [`control_and_wait`] then polls until the expected state is reached or
//! the timeout expires.

use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::status::{Control, State};

/// A service that can receive controls and be queried
pub trait ControlHandle {
    /// Error reported by the backend
    type Error: Display;

    /// Send a control and return the state reported right after it
    fn control(&self, control: Control) -> std::result::Result<State, Self::Error>;

    /// Query the current state
    fn query(&self) -> std::result::Result<State, Self::Error>;
}

/// Polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Delay between two queries
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(300),
        }
    }
}

/// Send `control` and wait until the service reaches its target state
pub fn control_and_wait<H: ControlHandle>(
    handle: &H,
    control: Control,
    options: WaitOptions,
) -> Result<()> {
    let target = control.target_state();
    let mut state = handle
        .control(control)
        .map_err(|e| Error::control_send(control, e))?;
    debug!(%control, %state, %target, "Control sent");

    let deadline = Instant::now().checked_add(options.timeout);
    while state != target {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(Error::Timeout { state: target });
        }
        std::thread::sleep(options.poll_interval);
        state = handle
            .query()
            .map_err(|e| Error::StatusQuery(e.to_string()))?;
        trace!(%state, "Polled service state");
    }
    Ok(())
}
