//! Database abstraction layer for db-probe.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably.

mod postgres;
mod sqlite;
mod sqlserver;
mod types;

pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use sqlserver::SqlServerClient;
pub use types::{ColumnInfo, Row, Value};

#[cfg(test)]
pub(crate) use types::CollectedRows;

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseBackend {
    #[default]
    SqlServer,
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend name as written in the properties file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlserver" | "mssql" => Some(Self::SqlServer),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::SqlServer => 1433,
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }
}

/// Opens a database client for the backend named in the configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    config.validate()?;
    match config.backend {
        DatabaseBackend::SqlServer => Ok(Box::new(SqlServerClient::connect(config).await?)),
        DatabaseBackend::Postgres => Ok(Box::new(PostgresClient::connect(config).await?)),
        DatabaseBackend::Sqlite => Ok(Box::new(SqliteClient::connect(config).await?)),
    }
}

/// Receives a statement's result set as the driver produces it.
///
/// `columns` is called at most once, before any row. Returning an error
/// abandons the rest of the result set.
pub trait RowSink: Send {
    fn columns(&mut self, columns: &[ColumnInfo]) -> Result<()>;

    fn row(&mut self, row: Row) -> Result<()>;
}

/// A single live database connection.
///
/// Statements are sent verbatim; implementations always use the
/// result-returning execution path.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a SQL statement, streaming its first result set into `sink`.
    ///
    /// Rows already handed to the sink stay delivered if the statement
    /// fails part way through.
    async fn execute_query(&mut self, sql: &str, sink: &mut dyn RowSink) -> Result<()>;

    /// Closes the database connection. Further queries fail.
    async fn close(&mut self) -> Result<()>;
}

/// True when a sqlx error means the connection itself is unusable, as
/// opposed to the statement failing.
fn is_connection_lost(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) | sqlx::Error::WorkerCrashed
    )
}

/// Runs `sql` and collects everything it returns.
#[cfg(test)]
pub(crate) async fn collect(
    db: &mut (dyn DatabaseClient + 'static),
    sql: &str,
) -> Result<CollectedRows> {
    let mut rows = CollectedRows::default();
    db.execute_query(sql, &mut rows).await?;
    Ok(rows)
}
