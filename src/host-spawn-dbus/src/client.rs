//! [`HostCommandTransport`] over the session bus.

use std::collections::HashMap;
use std::os::fd::AsFd;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};
use zbus::proxy::CacheProperties;
use zbus::zvariant::Fd;
use zbus::Connection;

use host_spawn_protocol::{
    ExitNotification, ExitNotifications, HostCommandRequest, HostCommandTransport, HostPid,
    HostSpawnError, Result,
};

use crate::proxy::DevelopmentProxy;
use crate::{DEVELOPMENT_INTERFACE, DEVELOPMENT_OBJECT_PATH, FLATPAK_BUS_NAME};

/// Connection to the Flatpak session helper.
#[derive(Debug, Clone)]
pub struct FlatpakDevelopment {
    proxy: DevelopmentProxy<'static>,
}

impl FlatpakDevelopment {
    /// Connect to the session bus named by `DBUS_SESSION_BUS_ADDRESS`.
    pub async fn connect() -> Result<Self> {
        let connection = Connection::session()
            .await
            .map_err(|e| HostSpawnError::Connection(e.to_string()))?;
        Self::with_connection(&connection).await
    }

    /// Reuse an existing bus connection.
    pub async fn with_connection(connection: &Connection) -> Result<Self> {
        let proxy = development_proxy(connection)
            .await
            .map_err(|e| HostSpawnError::Connection(e.to_string()))?;
        debug!("Using {} at {}", FLATPAK_BUS_NAME, DEVELOPMENT_OBJECT_PATH);
        Ok(Self { proxy })
    }
}

async fn development_proxy(connection: &Connection) -> zbus::Result<DevelopmentProxy<'static>> {
    DevelopmentProxy::builder(connection)
        .destination(FLATPAK_BUS_NAME)?
        .path(DEVELOPMENT_OBJECT_PATH)?
        .interface(DEVELOPMENT_INTERFACE)?
        .cache_properties(CacheProperties::No)
        .build()
        .await
}

#[async_trait]
impl HostCommandTransport for FlatpakDevelopment {
    async fn subscribe_exits(&self) -> Result<ExitNotifications> {
        let signals = self
            .proxy
            .receive_host_command_exited()
            .await
            .map_err(|e| HostSpawnError::Subscription(e.to_string()))?;
        debug!("Subscribed to HostCommandExited");

        let notifications = signals.filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(ExitNotification::new(*args.pid(), *args.exit_status())),
                Err(e) => {
                    warn!("Malformed HostCommandExited signal: {}", e);
                    None
                }
            }
        });
        Ok(notifications.boxed())
    }

    async fn host_command(&self, request: &HostCommandRequest) -> Result<HostPid> {
        let argv: Vec<&[u8]> = request.argv().iter().map(Vec::as_slice).collect();
        let fds: HashMap<u32, Fd<'_>> = request
            .fds()
            .iter()
            .map(|(&target, fd)| (target, Fd::from(fd.as_fd())))
            .collect();
        let envs: HashMap<&str, &str> = request
            .envs()
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();

        debug!(
            "HostCommand {} ({} args, flags {:#x})",
            request.program(),
            argv.len(),
            request.flags()
        );

        let pid = self
            .proxy
            .host_command(request.cwd_path(), &argv, fds, envs, request.flags())
            .await
            .map_err(|e| HostSpawnError::Call(e.to_string()))?;
        Ok(HostPid(pid))
    }

    async fn signal(&self, pid: HostPid, signal: i32) -> Result<()> {
        debug!("HostCommandSignal {} -> {}", signal, pid);
        self.proxy
            .host_command_signal(pid.as_u32(), signal as u32, false)
            .await
            .map_err(|e| HostSpawnError::Signal {
                pid,
                signal,
                message: e.to_string(),
            })
    }
}
