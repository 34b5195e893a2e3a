//! Windows Application event log
//!
//! Sources are registered with `EventCreate.exe` as message file, which
//! renders any message text for event ids 1 to 1000.

use std::io;
use std::ptr;

use svchelper_core::config::EventTypes;
use svchelper_core::EventLog;
use tracing::{debug, error, info, warn};
use winapi::shared::minwindef::WORD;
use winapi::um::winbase::{DeregisterEventSource, RegisterEventSourceW, ReportEventW};
use winapi::um::winnt::{
    EVENTLOG_ERROR_TYPE, EVENTLOG_INFORMATION_TYPE, EVENTLOG_WARNING_TYPE, HANDLE,
};
use winreg::enums::{RegDisposition, RegType, HKEY_LOCAL_MACHINE, KEY_WRITE};
use winreg::{RegKey, RegValue};

use super::to_wide;
use crate::error::{PlatformError, Result};

const APPLICATION_LOG_KEY: &str = r"SYSTEM\CurrentControlSet\Services\EventLog\Application";
const EVENT_CREATE_MESSAGE_FILE: &str = r"%SystemRoot%\System32\EventCreate.exe";

fn source_key(source: &str) -> String {
    format!(r"{APPLICATION_LOG_KEY}\{source}")
}

/// Register `source` in the Application log using EventCreate messages
///
/// Fails when the source is already registered.
pub fn install_event_source(source: &str, types: EventTypes) -> Result<()> {
    let path = source_key(source);
    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let (key, disposition) = hklm.create_subkey_with_flags(&path, KEY_WRITE)?;
    if matches!(disposition, RegDisposition::REG_OPENED_EXISTING_KEY) {
        return Err(PlatformError::EventLog(format!(
            "{path} registry key already exists"
        )));
    }

    key.set_value("CustomSource", &1u32)?;
    key.set_raw_value(
        "EventMessageFile",
        &RegValue {
            bytes: expand_sz_bytes(EVENT_CREATE_MESSAGE_FILE),
            vtype: RegType::REG_EXPAND_SZ,
        },
    )?;
    key.set_value("TypesSupported", &types.bits())?;

    debug!(source = %source, types = types.bits(), "Event log source registered");
    Ok(())
}

/// Delete the registry entry of `source`
pub fn remove_event_source(source: &str) -> Result<()> {
    RegKey::predef(HKEY_LOCAL_MACHINE).delete_subkey(source_key(source))?;
    debug!(source = %source, "Event log source removed");
    Ok(())
}

fn expand_sz_bytes(value: &str) -> Vec<u8> {
    to_wide(value)
        .into_iter()
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// Handle to a registered event-log source
///
/// Every entry is mirrored to `tracing`.
pub struct WindowsEventLog {
    handle: HANDLE,
    source: String,
}

// Event log handles may be used from any thread.
unsafe impl Send for WindowsEventLog {}
unsafe impl Sync for WindowsEventLog {}

impl WindowsEventLog {
    /// Open the event-log source `source`
    pub fn open(source: &str) -> Result<Self> {
        let wide = to_wide(source);
        let handle = unsafe { RegisterEventSourceW(ptr::null(), wide.as_ptr()) };
        if handle.is_null() {
            return Err(PlatformError::EventLog(io::Error::last_os_error().to_string()));
        }
        Ok(Self {
            handle,
            source: source.to_string(),
        })
    }

    fn report(&self, kind: WORD, eid: u32, msg: &str) -> svchelper_core::Result<()> {
        let wide = to_wide(msg);
        let mut strings = [wide.as_ptr()];
        let ok = unsafe {
            ReportEventW(
                self.handle,
                kind,
                0,
                eid,
                ptr::null_mut(),
                1,
                0,
                strings.as_mut_ptr(),
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(svchelper_core::Error::EventLog(
                io::Error::last_os_error().to_string(),
            ));
        }
        Ok(())
    }
}

impl EventLog for WindowsEventLog {
    fn info(&self, eid: u32, msg: &str) -> svchelper_core::Result<()> {
        info!(service = %self.source, event_id = eid, "{}", msg);
        self.report(EVENTLOG_INFORMATION_TYPE, eid, msg)
    }

    fn warning(&self, eid: u32, msg: &str) -> svchelper_core::Result<()> {
        warn!(service = %self.source, event_id = eid, "{}", msg);
        self.report(EVENTLOG_WARNING_TYPE, eid, msg)
    }

    fn error(&self, eid: u32, msg: &str) -> svchelper_core::Result<()> {
        error!(service = %self.source, event_id = eid, "{}", msg);
        self.report(EVENTLOG_ERROR_TYPE, eid, msg)
    }
}

impl Drop for WindowsEventLog {
    fn drop(&mut self) {
        unsafe { DeregisterEventSource(self.handle) };
    }
}
