//! @dose
//! purpose: CLI entry point for launchpad. Installs logging, bootstraps commands from the
//!     current directory and the framework root, and dispatches the requested command.
//!
//! when-editing:
//!     - !Business logic lives in the library; this file only wires the process around start()
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - The process exits with 0 on success, 1 on any error
//!
//! gotchas:
//!     - Log level comes from RUST_LOG and defaults to warn so broken modules are visible
//!     - The framework root comes from LAUNCHPAD_HOME, else the executable's directory

use launchpad::{start, ClapDispatcher, SkipUpdateCheck, StartOptions};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let options = StartOptions::from_env()?;
    start(
        options,
        env::args().collect(),
        &ClapDispatcher,
        &SkipUpdateCheck,
    )
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();

    if let Err(e) = result {
        eprintln!("Log system initialization failed: {e}");
    }
}
