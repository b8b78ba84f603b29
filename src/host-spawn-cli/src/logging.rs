//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Send all logs to stderr. `RUST_LOG` wins over `level`.
pub fn setup_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));

    // Ignore the error if a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
