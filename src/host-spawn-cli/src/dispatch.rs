//! The host command dispatcher.
//!
//! One call to `HostCommand`, the pid printed, and in
//! [`DispatchMode::WaitForExit`] a wait for the matching `HostCommandExited`
//! while forwarding the caller's signals to the host process.

use std::io::{self, Write};

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use host_spawn_protocol::{
    HostCommandRequest, HostCommandTransport, HostExitStatus, HostPid, HostSpawnError, Result,
    exits_for,
};

/// Fire-and-report or fire-and-wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Print the pid and return.
    Basic,
    /// Print the pid and block until the host process exits.
    WaitForExit,
}

impl DispatchMode {
    pub fn waits(&self) -> bool {
        matches!(self, Self::WaitForExit)
    }
}

/// What the dispatcher observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The command was started; nobody waited for it.
    Spawned(HostPid),
    /// The command ran to completion.
    Exited { pid: HostPid, status: HostExitStatus },
}

impl DispatchOutcome {
    pub fn pid(&self) -> HostPid {
        match self {
            Self::Spawned(pid) | Self::Exited { pid, .. } => *pid,
        }
    }
}

/// Runs one [`HostCommandRequest`] through a [`HostCommandTransport`].
pub struct Dispatcher<'a, T: HostCommandTransport + ?Sized> {
    transport: &'a T,
    mode: DispatchMode,
    print_pid: bool,
}

impl<'a, T: HostCommandTransport + ?Sized> Dispatcher<'a, T> {
    pub fn new(transport: &'a T, mode: DispatchMode) -> Self {
        Self {
            transport,
            mode,
            print_pid: true,
        }
    }

    /// Builder: whether to print the pid.
    pub fn print_pid(mut self, print_pid: bool) -> Self {
        self.print_pid = print_pid;
        self
    }

    /// Dispatch `request`, writing the pid to `out`.
    ///
    /// In [`DispatchMode::WaitForExit`], `after_spawn` runs once the pid has
    /// been printed and returns the signal numbers to relay to the host
    /// process while waiting. It is never called in [`DispatchMode::Basic`].
    pub async fn run<W, F, S>(
        &self,
        request: HostCommandRequest,
        out: &mut W,
        after_spawn: F,
    ) -> Result<DispatchOutcome>
    where
        W: Write + ?Sized,
        F: FnOnce() -> io::Result<S>,
        S: Stream<Item = i32> + Unpin,
    {
        // Subscribe before the call so the exit cannot slip past us.
        let notifications = if self.mode.waits() {
            Some(self.transport.subscribe_exits().await?)
        } else {
            None
        };

        let program = request.program();
        let pid = self.transport.host_command(&request).await?;
        // Our copies of the descriptors are no longer needed.
        drop(request);
        info!("Started {} on the host as pid {}", program, pid);

        if self.print_pid {
            writeln!(out, "{pid}")?;
            out.flush()?;
        }

        let Some(notifications) = notifications else {
            return Ok(DispatchOutcome::Spawned(pid));
        };

        // Signals delivered before this point keep their default action.
        let mut forwarded = after_spawn()?;

        let mut exits = exits_for(notifications, pid);
        loop {
            tokio::select! {
                notification = exits.next() => {
                    let notification =
                        notification.ok_or(HostSpawnError::NotificationStreamClosed { pid })?;
                    let status = notification.status();
                    debug!("Host process {} finished: {:?}", pid, status);
                    return Ok(DispatchOutcome::Exited { pid, status });
                }
                Some(signal) = forwarded.next() => {
                    debug!("Forwarding signal {} to host process {}", signal, pid);
                    if let Err(e) = self.transport.signal(pid, signal).await {
                        warn!("{}", e);
                    }
                }
            }
        }
    }
}
