//! `HostCommandExited` payload and wait-status decoding.

use super::HostPid;

/// One `HostCommandExited(pid, wait_status)` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitNotification {
    pub pid: HostPid,

    /// Raw `waitpid(2)` status as reported by the session helper.
    pub wait_status: u32,
}

impl ExitNotification {
    pub fn new(pid: impl Into<HostPid>, wait_status: u32) -> Self {
        Self {
            pid: pid.into(),
            wait_status,
        }
    }

    pub fn status(&self) -> HostExitStatus {
        HostExitStatus::from_wait_status(self.wait_status)
    }
}

/// How the host process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostExitStatus {
    /// Normal exit with the given code.
    Exited(i32),
    /// Killed by the given signal.
    Signaled(i32),
}

impl HostExitStatus {
    /// Decode a raw wait status (see `<bits/waitstatus.h>`).
    pub fn from_wait_status(status: u32) -> Self {
        let term_sig = status & 0x7f;
        if term_sig == 0 {
            Self::Exited(((status & 0xff00) >> 8) as i32)
        } else {
            Self::Signaled(term_sig as i32)
        }
    }
}
