//! PTY bridging for host-spawn.
//!
//! When the caller sits on a terminal, the host process gets a fresh
//! pseudo-terminal instead of the caller's descriptors. This crate opens the
//! pair, puts the caller's terminal in raw mode (crossterm) and pumps bytes
//! between the two until the host process is gone.
//!
//! ```text
//!  caller stdin ──▶ ┌────────┐        ┌───────┐
//!                   │ master │ ◀────▶ │ slave │ ──▶ fds 0, 1, 2 on the host
//!  caller stdout ◀─ └────────┘        └───────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut pty = host_spawn_pty::HostPty::open()?;
//! let stdio = StdioFds::shared(pty.slave())?;
//! // ... run the command on the host ...
//! pty.start()?;
//! // ... wait for it ...
//! pty.finish(host_spawn_pty::DRAIN_TIMEOUT);
//! ```

#![allow(unsafe_code)]

use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use nix::pty::{OpenptyResult, openpty};
use tracing::{debug, warn};

/// Terminal width used when the caller's size cannot be read.
pub const DEFAULT_COLS: u16 = 120;

/// Terminal height used when the caller's size cannot be read.
pub const DEFAULT_ROWS: u16 = 30;

/// How long [`HostPty::finish`] waits for trailing output.
pub const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Terminal dimensions, as in `struct winsize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl From<libc::winsize> for WindowSize {
    fn from(ws: libc::winsize) -> Self {
        Self {
            rows: ws.ws_row,
            cols: ws.ws_col,
            pixel_width: ws.ws_xpixel,
            pixel_height: ws.ws_ypixel,
        }
    }
}

impl From<WindowSize> for libc::winsize {
    fn from(size: WindowSize) -> Self {
        libc::winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: size.pixel_width,
            ws_ypixel: size.pixel_height,
        }
    }
}

/// Whether the caller's stdin is a terminal, i.e. a pty is worth allocating.
#[must_use]
pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

/// Read the window size of the terminal behind `fd`.
pub fn get_window_size(fd: BorrowedFd<'_>) -> io::Result<WindowSize> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let ret = unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCGWINSZ, &mut ws) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ws.into())
}

/// Set the window size of the terminal behind `fd`.
pub fn set_window_size(fd: BorrowedFd<'_>, size: WindowSize) -> io::Result<()> {
    let ws: libc::winsize = size.into();
    let ret = unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCSWINSZ, &ws) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Copy everything read from `master` to `out`, flushing after every read.
///
/// Prompts and escape sequences rarely end in a newline, so nothing may sit
/// in a buffer. Returns on EOF or EIO (every slave descriptor closed).
fn pump_output(mut master: File, mut out: impl Write) {
    let mut buf = [0u8; 4096];
    loop {
        let n = match master.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("pty output pump stopped: {}", e);
                return;
            }
        };
        if out.write_all(&buf[..n]).and_then(|()| out.flush()).is_err() {
            return;
        }
    }
}

/// A pty pair bridged to the caller's terminal.
pub struct HostPty {
    master: File,
    slave: Option<OwnedFd>,
    raw_mode: bool,
    output_done: Option<mpsc::Receiver<()>>,
}

impl HostPty {
    /// Open a new pty pair.
    pub fn open() -> io::Result<Self> {
        let OpenptyResult { master, slave } = openpty(None, None).map_err(io::Error::from)?;
        debug!(
            "Opened pty (master fd {}, slave fd {})",
            master.as_raw_fd(),
            slave.as_raw_fd()
        );

        Ok(Self {
            master: File::from(master),
            slave: Some(slave),
            raw_mode: false,
            output_done: None,
        })
    }

    /// The slave end, to be handed to the host process.
    ///
    /// # Panics
    ///
    /// Panics if called after [`finish`](Self::finish).
    pub fn slave(&self) -> BorrowedFd<'_> {
        self.slave
            .as_ref()
            .map(AsFd::as_fd)
            .unwrap_or_else(|| panic!("pty slave used after finish"))
    }

    /// Put stdin in raw mode and start pumping bytes in both directions.
    pub fn start(&mut self) -> io::Result<()> {
        if io::stdin().is_terminal() {
            enable_raw_mode()?;
            self.raw_mode = true;
        }

        let mut to_master = self.master.try_clone()?;
        thread::Builder::new()
            .name("pty-stdin".to_string())
            .spawn(move || {
                if let Err(e) = io::copy(&mut io::stdin(), &mut to_master) {
                    debug!("pty input pump stopped: {}", e);
                }
            })?;

        // Rust's Stdout is line buffered; write through our own descriptor.
        let stdout = File::from(io::stdout().as_fd().try_clone_to_owned()?);
        self.spawn_output_pump(stdout)?;

        if let Err(e) = self.inherit_window_size() {
            debug!("Falling back to default pty size: {}", e);
            set_window_size(self.master.as_fd(), WindowSize::default())?;
        }
        Ok(())
    }

    fn spawn_output_pump(&mut self, out: impl Write + Send + 'static) -> io::Result<()> {
        let from_master = self.master.try_clone()?;
        let (done_tx, done_rx) = mpsc::channel();
        thread::Builder::new()
            .name("pty-stdout".to_string())
            .spawn(move || {
                pump_output(from_master, out);
                let _ = done_tx.send(());
            })?;
        self.output_done = Some(done_rx);
        Ok(())
    }

    /// Copy the caller's window size to the pty.
    pub fn inherit_window_size(&self) -> io::Result<()> {
        let size = get_window_size(io::stdout().as_fd())?;
        set_window_size(self.master.as_fd(), size)
    }

    /// A handle that can resize this pty from another task.
    pub fn resizer(&self) -> io::Result<PtyResizer> {
        Ok(PtyResizer {
            master: self.master.try_clone()?,
        })
    }

    /// Close our slave end and give the output pump `timeout` to drain.
    pub fn finish(&mut self, timeout: Duration) {
        self.slave.take();
        if let Some(done) = self.output_done.take() {
            if done.recv_timeout(timeout).is_err() {
                debug!("pty output still open after {:?}", timeout);
            }
        }
        self.restore_stdin();
    }

    fn restore_stdin(&mut self) {
        if std::mem::take(&mut self.raw_mode) {
            if let Err(e) = disable_raw_mode() {
                warn!("Failed to restore terminal attributes: {}", e);
            }
        }
    }
}

/// Resizes a [`HostPty`] without borrowing it.
#[derive(Debug)]
pub struct PtyResizer {
    master: File,
}

impl PtyResizer {
    /// Copy the caller's window size to the pty.
    pub fn inherit_window_size(&self) -> io::Result<()> {
        let size = get_window_size(io::stdout().as_fd())?;
        set_window_size(self.master.as_fd(), size)
    }
}

impl Drop for HostPty {
    fn drop(&mut self) {
        self.restore_stdin();
    }
}
