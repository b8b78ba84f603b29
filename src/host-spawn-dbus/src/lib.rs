//! D-Bus transport for host-spawn.
//!
//! Talks to the Flatpak session helper, which exposes
//! `org.freedesktop.Flatpak.Development` on the session bus to sandboxed
//! applications that were granted `--talk-name=org.freedesktop.Flatpak`.

mod client;
mod proxy;

#[cfg(test)]
mod tests;

pub use client::FlatpakDevelopment;
pub use proxy::{DevelopmentProxy, HostCommandExited, HostCommandExitedStream};

/// Well-known bus name of the Flatpak session helper.
pub const FLATPAK_BUS_NAME: &str = "org.freedesktop.Flatpak";

/// Object path of the development interface.
pub const DEVELOPMENT_OBJECT_PATH: &str = "/org/freedesktop/Flatpak/Development";

/// Interface carrying `HostCommand` and `HostCommandExited`.
pub const DEVELOPMENT_INTERFACE: &str = "org.freedesktop.Flatpak.Development";
