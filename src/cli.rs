//! Command-line argument parsing for db-probe.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Run a file of SQL statements against a database and print every result set.
#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// File with one SQL statement per line
    #[arg(short = 'q', long = "query", value_name = "PATH")]
    pub query: PathBuf,

    /// Properties file with HOST, PORT, DB, USER and PASS
    #[arg(short = 'p', long = "properties", value_name = "PATH")]
    pub properties: PathBuf,

    /// Fail any statement that runs longer than this many seconds
    #[arg(short = 't', long, value_name = "SECS", env = "PROBE_QUERY_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments, returning clap's error (which carries
    /// the usage text) instead of exiting.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Returns the per-statement timeout, if one was requested.
    pub fn query_timeout(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Default log directive for this invocation.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
