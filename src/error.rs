//! Error types for db-probe.
//!
//! Driver and I/O failures are kept as the `source` of a [`ProbeError`], so
//! the full cause chain can be logged with [`ProbeError::report`].

use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// A driver error carried as the cause of a [`ProbeError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Main error type for probe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The connection could not be opened, or was closed under us.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The server rejected or failed a statement.
    #[error("Query error: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A statement ran past the per-statement limit.
    #[error("Query timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    /// A properties or query file could not be read.
    #[error("Cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Result rows could not be written out.
    #[error("Cannot write results")]
    Output(#[from] std::io::Error),
}

impl ProbeError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// A connection error keeping the driver error as its cause.
    pub fn connection_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// A query error keeping the driver error as its cause.
    pub fn query_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Query {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Formats the error followed by every underlying cause, outermost first.
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            report.push_str(": ");
            report.push_str(&err.to_string());
            cause = err.source();
        }
        report
    }
}

/// Result type alias using ProbeError.
pub type Result<T> = std::result::Result<T, ProbeError>;
