//! The seam between the dispatcher and the bus.

use async_trait::async_trait;
use futures::StreamExt;
use futures::future;
use futures::stream::{BoxStream, Stream};

use super::{ExitNotification, HostCommandRequest, HostPid, Result};

/// Stream of every `HostCommandExited` notification seen after subscribing.
pub type ExitNotifications = BoxStream<'static, ExitNotification>;

/// Something that can run commands on the host.
///
/// Implementations must buffer notifications from the moment
/// [`subscribe_exits`](Self::subscribe_exits) returns, so a listener
/// registered before [`host_command`](Self::host_command) cannot miss the
/// exit of the process that call spawns.
#[async_trait]
pub trait HostCommandTransport: Send + Sync {
    /// Register a listener for `HostCommandExited`.
    async fn subscribe_exits(&self) -> Result<ExitNotifications>;

    /// Run the request on the host and return the spawned pid.
    async fn host_command(&self, request: &HostCommandRequest) -> Result<HostPid>;

    /// Deliver `signal` to a process spawned by [`host_command`](Self::host_command).
    async fn signal(&self, pid: HostPid, signal: i32) -> Result<()>;
}

/// Keep only the notifications for `pid`.
pub fn exits_for(
    notifications: ExitNotifications,
    pid: HostPid,
) -> impl Stream<Item = ExitNotification> + Unpin + Send {
    notifications.filter(move |notification| {
        if notification.pid != pid {
            tracing::debug!(
                "Ignoring HostCommandExited for pid {} (waiting for {})",
                notification.pid,
                pid
            );
        }
        future::ready(notification.pid == pid)
    })
}
