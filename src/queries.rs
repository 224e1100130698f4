//! Query file reader.
//!
//! A query file holds one SQL statement per line. Blank lines and `--`
//! comment lines are skipped; every other line is kept verbatim, in order.

use crate::error::{ProbeError, Result};
use std::path::Path;
use tracing::{error, info};

/// Ordered list of SQL statements read from a query file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryList {
    statements: Vec<String>,
}

impl QueryList {
    /// Splits text into statements at newline boundaries.
    pub fn parse(content: &str) -> Self {
        let statements = content
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with("--")
            })
            .map(String::from)
            .collect();

        Self { statements }
    }

    /// Reads a query file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProbeError::read(path, e))?;

        Ok(Self::parse(&content))
    }

    /// Reads a query file, logging a read failure and returning an empty list.
    pub fn load_or_empty(path: &Path) -> Self {
        info!("Reading SQL queries file {}", path.display());
        match Self::load_from_file(path) {
            Ok(queries) => queries,
            Err(e) => {
                error!("{}", e.report());
                Self::default()
            }
        }
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true if there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Iterates the statements in file order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for QueryList {
    fn from(statements: Vec<String>) -> Self {
        Self { statements }
    }
}
