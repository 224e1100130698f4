//! SQLite database client implementation.
//!
//! Opens a single sqlx `SqliteConnection`. Handy for local files and for
//! exercising the executor against a real engine with `DB=:memory:`.

use crate::config::ConnectionConfig;
use crate::db::{is_connection_lost, ColumnInfo, DatabaseClient, Row, RowSink, Value};
use crate::error::{ProbeError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column as SqlxColumn, Connection, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    conn: Option<SqliteConnection>,
}

impl SqliteClient {
    /// Opens the database file named by `DB` (`:memory:` for a scratch database).
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let conn = SqliteConnection::connect(&conn_str).await.map_err(|e| {
            ProbeError::connection_caused_by(
                format!("Cannot open SQLite database '{}'", config.database),
                e,
            )
        })?;

        debug!("Opened SQLite database {}", config.database);
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| ProbeError::connection("Connection is closed"))
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&mut self, sql: &str, sink: &mut dyn RowSink) -> Result<()> {
        let conn = self.conn()?;
        let mut announced = false;

        {
            let mut rows = sqlx::query(sql).fetch(&mut *conn);
            while let Some(row) = rows.try_next().await.map_err(query_error)? {
                if !announced {
                    let columns: Vec<ColumnInfo> = row
                        .columns()
                        .iter()
                        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                        .collect();
                    sink.columns(&columns)?;
                    announced = true;
                }
                sink.row(convert_row(&row))?;
            }
        }

        // No rows: the prepared statement still knows its columns.
        if !announced {
            let columns: Vec<ColumnInfo> = conn
                .describe(sql)
                .await
                .map(|described| {
                    described
                        .columns()
                        .iter()
                        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                        .collect()
                })
                .unwrap_or_default();
            sink.columns(&columns)?;
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| ProbeError::connection_caused_by("Failed to close connection", e))?;
        }
        Ok(())
    }
}

fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// SQLite stores values by storage class, so the declared column type is
/// only consulted for the kinds that storage classes cannot express.
fn convert_value(row: &SqliteRow, index: usize, declared: &str) -> Value {
    let storage = match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => raw.type_info().name().to_uppercase(),
        _ => return Value::Null,
    };

    let by_declared = match declared.to_uppercase().as_str() {
        "BOOLEAN" => decode::<bool>(row, index).map(Value::Bool),
        "DATE" => decode::<NaiveDate>(row, index).map(Value::Date),
        "TIME" => decode::<NaiveTime>(row, index).map(Value::Time),
        "DATETIME" => decode::<NaiveDateTime>(row, index).map(Value::Timestamp),
        _ => None,
    };

    by_declared
        .or_else(|| match storage.as_str() {
            "INTEGER" | "INT4" | "INT8" | "BIGINT" => decode::<i64>(row, index).map(Value::Int),
            "REAL" => decode::<f64>(row, index).map(Value::Float),
            "BLOB" => decode::<Vec<u8>>(row, index).map(Value::Bytes),
            _ => decode::<String>(row, index).map(Value::Text),
        })
        .unwrap_or(Value::Null)
}

fn decode<'r, T>(row: &'r SqliteRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

fn query_error(error: sqlx::Error) -> ProbeError {
    if is_connection_lost(&error) {
        return ProbeError::connection_caused_by("Lost the SQLite connection", error);
    }
    let message = match error.as_database_error() {
        Some(db_error) => format!("ERROR: {}", db_error.message()),
        None => "Statement failed".to_string(),
    };
    ProbeError::query_caused_by(message, error)
}
