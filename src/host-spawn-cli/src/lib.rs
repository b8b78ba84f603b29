//! host-spawn - run commands on the host from inside a Flatpak sandbox.
//!
//! - `cli` - argument parsing and environment configuration
//! - `dispatch` - the `HostCommand` call and the wait for `HostCommandExited`
//! - `signals` - signal relaying and pty resizing while waiting
//! - `logging` - tracing setup (stderr only)

pub mod cli;
pub mod dispatch;
pub mod logging;
pub mod signals;


pub use cli::{Args, LogLevel};
pub use dispatch::{DispatchMode, DispatchOutcome, Dispatcher};

use anyhow::{Context, Result, bail};
use host_spawn_dbus::FlatpakDevelopment;
use host_spawn_protocol::{HostCommandRequest, HostExitStatus, StdioFds};
use host_spawn_pty::{DRAIN_TIMEOUT, HostPty};

/// Exit code used when the command could not be run on the host.
pub const FAILURE_EXIT_CODE: i32 = 127;

/// Map a dispatch outcome to this process's exit code.
pub fn exit_code(outcome: &DispatchOutcome) -> Result<i32> {
    match outcome {
        DispatchOutcome::Spawned(_) => Ok(0),
        DispatchOutcome::Exited {
            status: HostExitStatus::Exited(code),
            ..
        } => Ok(*code),
        DispatchOutcome::Exited {
            pid,
            status: HostExitStatus::Signaled(signal),
        } => bail!("child process did not terminate cleanly (pid {pid} killed by signal {signal})"),
    }
}

/// Run `args.command` on the host and return the exit code to use.
pub async fn run(args: Args) -> Result<i32> {
    let mode = args.mode();
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;

    let mut pty = if args.wants_pty(host_spawn_pty::stdin_is_terminal()) {
        Some(HostPty::open().context("Failed to allocate a pty")?)
    } else {
        None
    };

    let stdio = match &pty {
        Some(pty) => StdioFds::shared(pty.slave())?,
        None => StdioFds::inherit()?,
    };
    let request = HostCommandRequest::new(&cwd, &args.command, stdio)?;

    let transport = FlatpakDevelopment::connect().await?;

    let resizer = match &pty {
        Some(pty) => Some(signals::spawn_window_resizer(pty)?),
        None => None,
    };

    // Raw mode and signal handlers start after the pid is printed.
    let after_spawn = || -> std::io::Result<_> {
        if let Some(pty) = pty.as_mut() {
            pty.start()?;
        }
        signals::forwarded_signals()
    };

    let outcome = Dispatcher::new(&transport, mode)
        .print_pid(!args.quiet)
        .run(request, &mut std::io::stdout(), after_spawn)
        .await;

    if let Some(resizer) = resizer {
        resizer.abort();
    }
    if let Some(pty) = pty.as_mut() {
        pty.finish(DRAIN_TIMEOUT);
    }

    exit_code(&outcome?)
}
