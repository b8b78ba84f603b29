//! Client proxy for `org.freedesktop.Flatpak.Development`.

use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::Fd;

#[proxy(
    interface = "org.freedesktop.Flatpak.Development",
    default_service = "org.freedesktop.Flatpak",
    default_path = "/org/freedesktop/Flatpak/Development",
    gen_blocking = false
)]
pub trait Development {
    /// `HostCommand(ay cwd_path, aay argv, a{uh} fds, a{ss} envs, u flags) -> u pid`
    fn host_command(
        &self,
        cwd_path: &[u8],
        argv: &[&[u8]],
        fds: HashMap<u32, Fd<'_>>,
        envs: HashMap<&str, &str>,
        flags: u32,
    ) -> zbus::Result<u32>;

    /// `HostCommandSignal(u pid, u signal, b to_process_group)`
    fn host_command_signal(&self, pid: u32, signal: u32, to_process_group: bool)
    -> zbus::Result<()>;

    #[zbus(signal)]
    fn host_command_exited(&self, pid: u32, exit_status: u32) -> zbus::Result<()>;
}
