//! Shared fixtures for the integration tests.

use std::path::PathBuf;

use clap::Parser;
use db_probe::cli::Cli;
use tempfile::TempDir;

/// A temporary directory holding a properties file and a query file.
pub struct Fixture {
    // Kept so the directory outlives the test.
    _dir: TempDir,
    pub properties: PathBuf,
    pub queries: PathBuf,
}

impl Fixture {
    /// Writes both files into a fresh temporary directory.
    pub fn new(properties: impl AsRef<[u8]>, queries: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let properties_path = dir.path().join("db.properties");
        let queries_path = dir.path().join("queries.sql");

        std::fs::write(&properties_path, properties).unwrap();
        std::fs::write(&queries_path, queries).unwrap();

        Self {
            _dir: dir,
            properties: properties_path,
            queries: queries_path,
        }
    }

    /// A fixture whose properties point at an in-memory SQLite database.
    pub fn sqlite(queries: &str) -> Self {
        Self::new("BACKEND=sqlite\nDB=:memory:\n", queries)
    }

    /// Command-line arguments pointing at this fixture's files.
    pub fn args(&self) -> Vec<String> {
        vec![
            "--query".to_string(),
            self.queries.display().to_string(),
            "--properties".to_string(),
            self.properties.display().to_string(),
        ]
    }

    /// Parses a CLI invocation pointing at this fixture's files.
    pub fn cli(&self) -> Cli {
        let mut argv = vec!["probe".to_string()];
        argv.extend(self.args());
        Cli::try_parse_from(argv).unwrap()
    }
}
