//! Command-line arguments.

use std::ffi::OsString;

use clap::Parser;
use clap::builder::FalseyValueParser;

use crate::dispatch::DispatchMode;

/// Log verbosity level. Logs go to stderr; stdout carries only the pid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Run a command on the host from inside a Flatpak sandbox.
///
/// Everything from COMMAND onward is forwarded verbatim. The pid of the host
/// process is printed on stdout.
#[derive(Debug, Parser)]
#[command(name = "host-spawn", version, about, long_about = None)]
pub struct Args {
    /// Wait for the host process to exit and exit with its status.
    #[arg(short, long, env = "HOST_SPAWN_WAIT", value_parser = FalseyValueParser::new())]
    pub wait: bool,

    /// Never allocate a pseudo-terminal for the host process.
    #[arg(long, env = "HOST_SPAWN_NO_PTY", value_parser = FalseyValueParser::new())]
    pub no_pty: bool,

    /// Do not print the host pid.
    #[arg(short, long, env = "HOST_SPAWN_QUIET", value_parser = FalseyValueParser::new())]
    pub quiet: bool,

    /// Log level (RUST_LOG takes precedence).
    #[arg(long, value_enum, env = "HOST_SPAWN_LOG_LEVEL", default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Command and arguments to run on the host.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true
    )]
    pub command: Vec<OsString>,
}

impl Args {
    pub fn mode(&self) -> DispatchMode {
        if self.wait {
            DispatchMode::WaitForExit
        } else {
            DispatchMode::Basic
        }
    }

    /// A pty only makes sense while we stay alive to pump it.
    pub fn wants_pty(&self, stdin_is_terminal: bool) -> bool {
        self.wait && !self.no_pty && stdin_is_terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("parse")
    }

    #[test]
    #[serial]
    fn test_defaults_to_basic_mode() {
        let args = parse(&["host-spawn", "ls", "-la"]);
        assert_eq!(args.mode(), DispatchMode::Basic);
        assert_eq!(args.command, vec![OsString::from("ls"), OsString::from("-la")]);
        assert_eq!(args.log_level, LogLevel::Warn);
        assert!(!args.quiet);
    }

    #[test]
    #[serial]
    fn test_options_after_command_are_forwarded() {
        let args = parse(&["host-spawn", "--wait", "grep", "--wait", "-q", "--", "x"]);
        assert_eq!(args.mode(), DispatchMode::WaitForExit);
        assert!(!args.quiet);
        assert_eq!(
            args.command,
            ["grep", "--wait", "-q", "--", "x"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    #[serial]
    fn test_double_dash_separates_command() {
        let args = parse(&["host-spawn", "--", "--version"]);
        assert_eq!(args.command, vec![OsString::from("--version")]);
    }

    #[test]
    #[serial]
    fn test_command_is_required() {
        let err = Args::try_parse_from(["host-spawn"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    #[serial]
    fn test_wait_from_environment() {
        // SAFETY: serialized with the other env-reading tests
        unsafe { std::env::set_var("HOST_SPAWN_WAIT", "1") };
        let args = parse(&["host-spawn", "true"]);
        unsafe { std::env::remove_var("HOST_SPAWN_WAIT") };
        assert_eq!(args.mode(), DispatchMode::WaitForExit);
    }

    #[test]
    #[serial]
    fn test_falsey_environment_value() {
        unsafe { std::env::set_var("HOST_SPAWN_WAIT", "false") };
        let args = parse(&["host-spawn", "true"]);
        unsafe { std::env::remove_var("HOST_SPAWN_WAIT") };
        assert_eq!(args.mode(), DispatchMode::Basic);
    }

    #[test]
    #[serial]
    fn test_wants_pty() {
        let basic = parse(&["host-spawn", "vim"]);
        assert!(!basic.wants_pty(true));

        let wait = parse(&["host-spawn", "-w", "vim"]);
        assert!(wait.wants_pty(true));
        assert!(!wait.wants_pty(false));

        let no_pty = parse(&["host-spawn", "-w", "--no-pty", "vim"]);
        assert!(!no_pty.wants_pty(true));
    }

    #[test]
    #[serial]
    fn test_log_level_filter() {
        let args = parse(&["host-spawn", "--log-level", "debug", "true"]);
        assert_eq!(args.log_level.as_filter_str(), "debug");
    }
}
