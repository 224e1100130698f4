//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using a single sqlx connection.

use crate::config::ConnectionConfig;
use crate::db::{
    is_connection_lost, ColumnInfo, DatabaseBackend, DatabaseClient, Row, RowSink, Value,
};
use crate::error::{ProbeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::TryStreamExt;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgConnection, PgRow, PgValueFormat};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{Column as SqlxColumn, Connection, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::fmt::Display;
use tracing::debug;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
}

impl PostgresClient {
    /// Opens a single connection to the configured server.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let conn = PgConnection::connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to PostgreSQL");
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| ProbeError::connection("Connection is closed"))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
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

        // Column metadata for an empty result comes from the prepared statement.
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

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name.to_uppercase().as_str() {
        "BOOL" => decode::<bool>(row, index).map(Value::Bool),

        "INT2" => decode::<i16>(row, index).map(|v| Value::Int(v as i64)),

        "INT4" => decode::<i32>(row, index).map(|v| Value::Int(v as i64)),

        "INT8" => decode::<i64>(row, index).map(Value::Int),

        "FLOAT4" => decode::<f32>(row, index).map(|v| Value::Float(v as f64)),

        "FLOAT8" => decode::<f64>(row, index).map(Value::Float),

        "NUMERIC" => decode::<Decimal>(row, index)
            .map(|d| Value::Decimal(d.to_string()))
            .or_else(|| special_numeric(row, index)),

        "BYTEA" => decode::<Vec<u8>>(row, index).map(Value::Bytes),

        "DATE" => decode::<NaiveDate>(row, index).map(Value::Date),

        "TIME" => decode::<NaiveTime>(row, index).map(Value::Time),

        "TIMESTAMP" => decode::<NaiveDateTime>(row, index).map(Value::Timestamp),

        "TIMESTAMPTZ" => {
            decode::<DateTime<Utc>>(row, index).map(|v| Value::TimestampTz(v.fixed_offset()))
        }

        "INTERVAL" => decode::<PgInterval>(row, index).map(|v| Value::Text(format_interval(&v))),

        "UUID" => decode::<Uuid>(row, index).map(|v| Value::Text(v.to_string())),

        "JSON" | "JSONB" => decode::<JsonValue>(row, index).map(|v| Value::Text(v.to_string())),

        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            decode::<Vec<Option<String>>>(row, index).map(format_array)
        }

        "BOOL[]" => decode::<Vec<Option<bool>>>(row, index).map(format_array),

        "INT2[]" => decode::<Vec<Option<i16>>>(row, index).map(format_array),

        "INT4[]" => decode::<Vec<Option<i32>>>(row, index).map(format_array),

        "INT8[]" => decode::<Vec<Option<i64>>>(row, index).map(format_array),

        "FLOAT8[]" => decode::<Vec<Option<f64>>>(row, index).map(format_array),

        "NUMERIC[]" => decode::<Vec<Option<Decimal>>>(row, index).map(format_array),

        // For all other types, try to get as string
        _ => decode::<String>(row, index).map(Value::Text),
    };

    decoded.unwrap_or_else(|| undecodable(row, index, type_name))
}

fn decode<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

/// NaN and the infinities have no `Decimal` form. They are flagged by the
/// sign word of the binary numeric header.
fn special_numeric(row: &PgRow, index: usize) -> Option<Value> {
    let raw = row.try_get_raw(index).ok()?;
    if !matches!(raw.format(), PgValueFormat::Binary) {
        return None;
    }
    let bytes = raw.as_bytes().ok()?;
    let sign = u16::from_be_bytes([*bytes.get(4)?, *bytes.get(5)?]);
    let text = match sign {
        0xC000 => "NaN",
        0xD000 => "Infinity",
        0xF000 => "-Infinity",
        _ => return None,
    };
    Some(Value::Decimal(text.to_string()))
}

/// Renders an interval the way psql does, e.g. `1 year 2 mons 3 days 04:05:06`.
fn format_interval(interval: &PgInterval) -> String {
    let mut parts = Vec::new();

    let years = interval.months / 12;
    let months = interval.months % 12;
    if years != 0 {
        parts.push(format!("{years} year{}", if years.abs() == 1 { "" } else { "s" }));
    }
    if months != 0 {
        parts.push(format!("{months} mon{}", if months.abs() == 1 { "" } else { "s" }));
    }
    if interval.days != 0 {
        let days = interval.days;
        parts.push(format!("{days} day{}", if days.abs() == 1 { "" } else { "s" }));
    }

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let micros = micros.unsigned_abs();
        let seconds = micros / 1_000_000;
        let fraction = micros % 1_000_000;
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds / 60) % 60,
            seconds % 60
        );
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}

/// Renders an array in Postgres' `{a,b,NULL}` text form.
fn format_array<T: Display>(items: Vec<Option<T>>) -> Value {
    let elements: Vec<String> = items
        .into_iter()
        .map(|item| match item {
            None => "NULL".to_string(),
            Some(value) => quote_array_element(&value.to_string()),
        })
        .collect();
    Value::Text(format!("{{{}}}", elements.join(",")))
}

fn quote_array_element(element: &str) -> String {
    let needs_quotes = element.is_empty()
        || element.eq_ignore_ascii_case("null")
        || element
            .chars()
            .any(|c| matches!(c, ',' | '{' | '}' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return element.to_string();
    }
    let escaped = element.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Shows a value without a dedicated decoder as the text the server sent,
/// when it is text (enums, domains over text). Anything else becomes a
/// placeholder naming its type.
fn undecodable(row: &PgRow, index: usize, type_name: &str) -> Value {
    let raw = match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => raw,
        _ => return Value::Null,
    };

    let text = match raw.format() {
        PgValueFormat::Text => raw.as_str().ok(),
        PgValueFormat::Binary => raw
            .as_bytes()
            .ok()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .filter(|s| !s.chars().any(char::is_control)),
    };

    match text {
        Some(text) => Value::Text(text.to_string()),
        None => Value::Text(format!("<{}>", type_name.to_lowercase())),
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ProbeError {
    let host = config.host.trim();
    let port = config
        .port_number()
        .unwrap_or(DatabaseBackend::Postgres.default_port());
    let user = if config.user.is_empty() {
        "unknown"
    } else {
        config.user.as_str()
    };

    let error_str = error.to_string().to_lowercase();

    let message = if error_str.contains("connection refused")
        || error_str.contains("could not connect")
    {
        format!("Cannot connect to {host}:{port}. Check that the server is running.")
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        format!("Authentication failed for user '{user}'. Check your credentials.")
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        format!("Database '{}' does not exist.", config.database)
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        )
    } else {
        format!("Cannot connect to {host}:{port}")
    };

    ProbeError::connection_caused_by(message, error)
}

/// Wraps a query error, formatting PostgreSQL detail and hint if available.
fn query_error(error: sqlx::Error) -> ProbeError {
    if is_connection_lost(&error) {
        return ProbeError::connection_caused_by("Connection to the server was lost", error);
    }
    let message = match error.as_database_error() {
        Some(db_error) => {
            let mut message = String::from("ERROR: ");
            message.push_str(db_error.message());

            if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
            {
                if let Some(detail) = pg_error.detail() {
                    message.push_str("\n  DETAIL: ");
                    message.push_str(detail);
                }

                if let Some(hint) = pg_error.hint() {
                    message.push_str("\n  HINT: ");
                    message.push_str(hint);
                }

                if let Some(constraint) = pg_error.constraint() {
                    message.push_str("\n  CONSTRAINT: ");
                    message.push_str(constraint);
                }
            }
            message
        }
        None => "Statement failed".to_string(),
    };

    ProbeError::query_caused_by(message, error)
}
