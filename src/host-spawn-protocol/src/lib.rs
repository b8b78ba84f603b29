//! Types shared by every host-spawn crate.
//!
//! A sandboxed process asks the Flatpak session helper to run a command on
//! the host. This crate describes that exchange without tying it to a bus
//! implementation:
//!
//! - [`HostCommandRequest`] - the marshaled invocation (cwd, argv, fds, env, flags)
//! - [`ExitNotification`] / [`HostExitStatus`] - the `HostCommandExited` payload
//! - [`HostCommandTransport`] - the seam between the dispatcher and the bus
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  HostCommand(request)   ┌─────────────────────┐
//! │  dispatcher  │ ──────────────────────▶ │ HostCommandTransport │
//! │              │ ◀────────────────────── │  (D-Bus, test double)│
//! └──────────────┘  pid / ExitNotification └─────────────────────┘
//! ```

pub mod exit_status;
pub mod request;
pub mod transport;


pub use exit_status::{ExitNotification, HostExitStatus};
pub use request::{DEFAULT_TERM, HostCommandRequest, STDIO_FDS, StdioFds, nul_terminated};
pub use transport::{ExitNotifications, HostCommandTransport, exits_for};

use std::fmt;
use thiserror::Error;

/// Process id of a command spawned on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPid(pub u32);

impl HostPid {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HostPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for HostPid {
    fn from(pid: u32) -> Self {
        Self(pid)
    }
}

/// Errors raised while dispatching a host command.
#[derive(Debug, Error)]
pub enum HostSpawnError {
    /// No command was given.
    #[error("No command specified")]
    EmptyCommand,

    /// The session bus could not be reached.
    #[error("Failed to connect to the session bus: {0}")]
    Connection(String),

    /// The remote call was rejected or failed in transit.
    #[error("{0}")]
    Call(String),

    /// The exit notification listener could not be registered.
    #[error("Failed to subscribe to HostCommandExited: {0}")]
    Subscription(String),

    /// The notification stream ended before the host process exited.
    #[error("Notification stream closed before host process {pid} exited")]
    NotificationStreamClosed { pid: HostPid },

    /// Forwarding a signal to the host process failed.
    #[error("Failed to send signal {signal} to host process {pid}: {message}")]
    Signal {
        pid: HostPid,
        signal: i32,
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HostSpawnError>;
