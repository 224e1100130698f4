//! SQL Server database client implementation.
//!
//! Provides the `SqlServerClient` struct that implements the `DatabaseClient`
//! trait for Microsoft SQL Server using tiberius over a tokio TCP stream.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseBackend, DatabaseClient, Row, RowSink, Value};
use crate::error::{ProbeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use tiberius::error::Error as TdsError;
use tiberius::{Client, Column, ColumnData, Config, FromSql, QueryItem};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

/// SQL Server error number for a rejected login.
const LOGIN_FAILED: u32 = 18456;

/// SQL Server error number for a database the login cannot open.
const CANNOT_OPEN_DATABASE: u32 = 4060;

type TdsClient = Client<Compat<TcpStream>>;

/// SQL Server database client holding one TDS connection.
pub struct SqlServerClient {
    client: Option<TdsClient>,
}

impl SqlServerClient {
    /// Opens a connection using SQL Server authentication with the
    /// configured user and password.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let tds_config = Config::from_ado_string(&conn_str)
            .map_err(|e| ProbeError::connection_caused_by("Invalid connection string", e))?;

        let client = match open(tds_config.clone()).await {
            // Azure SQL gateways answer the login with a redirect to the
            // node that actually hosts the database.
            Err(TdsError::Routing { host, port }) => {
                info!("Server redirected connection to {}:{}", host, port);
                let mut routed = tds_config;
                routed.host(&host);
                routed.port(port);
                open(routed).await
            }
            other => other,
        }
        .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to SQL Server");
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&mut self) -> Result<&mut TdsClient> {
        self.client
            .as_mut()
            .ok_or_else(|| ProbeError::connection("Connection is closed"))
    }
}

async fn open(config: Config) -> tiberius::Result<TdsClient> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    Client::connect(config, tcp.compat_write()).await
}

#[async_trait]
impl DatabaseClient for SqlServerClient {
    async fn execute_query(&mut self, sql: &str, sink: &mut dyn RowSink) -> Result<()> {
        let client = self.client()?;

        let mut stream = client.simple_query(sql).await.map_err(query_error)?;

        // The whole stream is drained so the connection is ready for the next
        // statement; only the first result set reaches the sink.
        let mut announced = false;
        while let Some(item) = stream.try_next().await.map_err(query_error)? {
            match item {
                QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                    sink.columns(&column_info(meta.columns()))?;
                    announced = true;
                }
                QueryItem::Metadata(meta) => {
                    debug!("Skipping result set {}", meta.result_index() + 1);
                }
                QueryItem::Row(row) if row.result_index() == 0 => sink.row(convert_row(row))?,
                QueryItem::Row(_) => {}
            }
        }

        if !announced {
            sink.columns(&[])?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| ProbeError::connection_caused_by("Failed to close connection", e))?;
        }
        Ok(())
    }
}

fn column_info(columns: &[Column]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), format!("{:?}", col.column_type())))
        .collect()
}

/// Converts a tiberius row to our Row type.
fn convert_row(row: tiberius::Row) -> Row {
    row.into_iter().map(convert_value).collect()
}

/// Converts a single TDS column value to our Value type.
fn convert_value(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::Int).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|v| Value::Float(v as f64)).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(Value::Float).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .map(|s| Value::Text(s.into_owned()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => v
            .map(|g| Value::Text(g.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .map(|b| Value::Bytes(b.into_owned()))
            .unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v
            .map(|n| Value::Decimal(n.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .map(|x| Value::Text(x.into_owned().into_string()))
            .unwrap_or(Value::Null),
        temporal => convert_temporal(&temporal),
    }
}

/// Converts the date and time column kinds through tiberius' chrono support.
fn convert_temporal(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::Date(_) => NaiveDate::from_sql(data)
            .ok()
            .flatten()
            .map(Value::Date)
            .unwrap_or(Value::Null),
        ColumnData::Time(_) => NaiveTime::from_sql(data)
            .ok()
            .flatten()
            .map(Value::Time)
            .unwrap_or(Value::Null),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(data)
            .ok()
            .flatten()
            .map(Value::TimestampTz)
            .unwrap_or(Value::Null),
        _ => NaiveDateTime::from_sql(data)
            .ok()
            .flatten()
            .map(Value::Timestamp)
            .unwrap_or(Value::Null),
    }
}

/// Maps tiberius connection errors to user-friendly messages.
fn map_connection_error(error: TdsError, config: &ConnectionConfig) -> ProbeError {
    let host = config.host.trim();
    let port = config
        .port_number()
        .unwrap_or(DatabaseBackend::SqlServer.default_port());

    let message = match &error {
        TdsError::Server(token) if token.code() == LOGIN_FAILED => {
            format!("Login failed for user '{}'. Check your credentials.", config.user)
        }
        TdsError::Server(token) if token.code() == CANNOT_OPEN_DATABASE => {
            format!("Cannot open database '{}'", config.database)
        }
        TdsError::Tls(_) => format!(
            "TLS handshake with {host}:{port} failed. Set TRUST_CERT=true for self-signed certificates."
        ),
        TdsError::Io { message, .. } => {
            let lower = message.to_lowercase();
            if lower.contains("refused") {
                format!("Cannot connect to {host}:{port}. Check that the server is running.")
            } else if lower.contains("timed out") {
                format!(
                    "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
                )
            } else {
                format!("Cannot connect to {host}:{port}")
            }
        }
        _ => format!("Cannot connect to {host}:{port}"),
    };

    ProbeError::connection_caused_by(message, error)
}

/// Wraps a query error, formatting server messages the way SQL Server tools
/// print them.
fn query_error(error: TdsError) -> ProbeError {
    match &error {
        TdsError::Server(token) => {
            let message = format!(
                "Msg {}, Level {}, State {}, Line {}: {}",
                token.code(),
                token.class(),
                token.state(),
                token.line(),
                token.message()
            );
            ProbeError::query_caused_by(message, error)
        }
        // Anything but a server message means the TDS stream itself broke.
        _ => ProbeError::connection_caused_by("Connection to the server was lost", error),
    }
}
