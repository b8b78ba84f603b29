//! The marshaled `HostCommand` invocation.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use super::{HostSpawnError, Result};

/// `TERM` value handed to the host process.
pub const DEFAULT_TERM: &str = "xterm-256color";

/// Descriptor numbers every request maps.
pub const STDIO_FDS: [u32; 3] = [0, 1, 2];

/// Append the trailing NUL the `ay` arguments of `HostCommand` expect.
pub fn nul_terminated(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.extend_from_slice(bytes);
    out.push(0);
    out
}

/// The three descriptors the host process will use as stdin, stdout and stderr.
///
/// Each one is a duplicate of the caller's descriptor, so both ends share the
/// same open file description.
#[derive(Debug)]
pub struct StdioFds {
    stdin: OwnedFd,
    stdout: OwnedFd,
    stderr: OwnedFd,
}

impl StdioFds {
    /// Duplicate the caller's own standard streams.
    pub fn inherit() -> io::Result<Self> {
        Ok(Self {
            stdin: io::stdin().as_fd().try_clone_to_owned()?,
            stdout: io::stdout().as_fd().try_clone_to_owned()?,
            stderr: io::stderr().as_fd().try_clone_to_owned()?,
        })
    }

    /// Use one descriptor (a pty slave) for all three streams.
    pub fn shared(fd: impl AsFd) -> io::Result<Self> {
        let fd = fd.as_fd();
        Ok(Self {
            stdin: fd.try_clone_to_owned()?,
            stdout: fd.try_clone_to_owned()?,
            stderr: fd.try_clone_to_owned()?,
        })
    }

    fn into_map(self) -> BTreeMap<u32, OwnedFd> {
        BTreeMap::from([(0, self.stdin), (1, self.stdout), (2, self.stderr)])
    }
}

/// Arguments of one `HostCommand` call.
///
/// Built once per run and never mutated afterwards.
#[derive(Debug)]
pub struct HostCommandRequest {
    cwd_path: Vec<u8>,
    argv: Vec<Vec<u8>>,
    fds: BTreeMap<u32, OwnedFd>,
    envs: BTreeMap<String, String>,
    flags: u32,
}

impl HostCommandRequest {
    /// Marshal `args` to run in `cwd` with the given standard streams.
    pub fn new<S: AsRef<OsStr>>(cwd: &Path, args: &[S], stdio: StdioFds) -> Result<Self> {
        if args.is_empty() {
            return Err(HostSpawnError::EmptyCommand);
        }

        let argv = args
            .iter()
            .map(|arg| nul_terminated(arg.as_ref().as_bytes()))
            .collect();

        Ok(Self {
            cwd_path: nul_terminated(cwd.as_os_str().as_bytes()),
            argv,
            fds: stdio.into_map(),
            envs: BTreeMap::from([("TERM".to_string(), DEFAULT_TERM.to_string())]),
            flags: 0,
        })
    }

    pub fn cwd_path(&self) -> &[u8] {
        &self.cwd_path
    }

    pub fn argv(&self) -> &[Vec<u8>] {
        &self.argv
    }

    pub fn fds(&self) -> &BTreeMap<u32, OwnedFd> {
        &self.fds
    }

    pub fn envs(&self) -> &BTreeMap<String, String> {
        &self.envs
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Program name without its NUL, for log lines.
    pub fn program(&self) -> String {
        let first = self.argv.first().map(Vec::as_slice).unwrap_or_default();
        String::from_utf8_lossy(first.strip_suffix(&[0]).unwrap_or(first)).into_owned()
    }
}
