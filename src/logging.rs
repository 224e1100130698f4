//! Logging configuration for db-probe.
//!
//! Phase logs go to stdout so they interleave with the result dumps in the
//! order things happened.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Initializes logging to stdout.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies.
pub fn init_stdout_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(default_level))
        .with_writer(std::io::stdout)
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(false)
        .init();
}

/// Builds the filter from `RUST_LOG`, falling back to `default_level`.
fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
