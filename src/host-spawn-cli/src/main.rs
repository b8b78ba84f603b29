//! host-spawn binary.
//!
//! Usage:
//!   host-spawn [--wait] [--no-pty] [--quiet] COMMAND [ARGS...]

use std::process::ExitCode;

use clap::Parser;
use host_spawn_cli::{Args, FAILURE_EXIT_CODE, logging};

fn main() -> ExitCode {
    let args = Args::parse();
    logging::setup_logging(args.log_level);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start the async runtime: {e}");
            return ExitCode::from(FAILURE_EXIT_CODE as u8);
        }
    };

    match runtime.block_on(host_spawn_cli::run(args)) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(FAILURE_EXIT_CODE as u8)
        }
    }
}
