//! Signals relayed to the host process while waiting for it.

use std::io;

use futures::stream::{self, BoxStream, SelectAll};
use futures::StreamExt;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::debug;

use host_spawn_pty::HostPty;

/// Signals the caller receives that the host process should receive too.
pub const FORWARDED_SIGNALS: &[libc::c_int] = &[
    libc::SIGINT,
    libc::SIGTERM,
    libc::SIGHUP,
    libc::SIGQUIT,
    libc::SIGUSR1,
    libc::SIGUSR2,
];

fn signal_stream(signum: libc::c_int) -> io::Result<BoxStream<'static, i32>> {
    let listener: Signal = signal(SignalKind::from_raw(signum))?;
    Ok(stream::unfold(listener, move |mut listener| async move {
        listener.recv().await.map(|()| (signum, listener))
    })
    .boxed())
}

/// Install handlers for [`FORWARDED_SIGNALS`] and merge them into one stream.
///
/// Once installed, these signals no longer terminate this process.
pub fn forwarded_signals() -> io::Result<SelectAll<BoxStream<'static, i32>>> {
    let streams = FORWARDED_SIGNALS
        .iter()
        .map(|&signum| signal_stream(signum))
        .collect::<io::Result<Vec<_>>>()?;
    Ok(stream::select_all(streams))
}

/// Resize the pty to the caller's terminal on every `SIGWINCH`.
pub fn spawn_window_resizer(pty: &HostPty) -> io::Result<tokio::task::JoinHandle<()>> {
    let resizer = pty.resizer()?;
    let mut window_changes = signal(SignalKind::window_change())?;
    Ok(tokio::spawn(async move {
        while window_changes.recv().await.is_some() {
            if let Err(e) = resizer.inherit_window_size() {
                debug!("Could not resize pty: {}", e);
            }
        }
    }))
}
