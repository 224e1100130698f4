//! Connection configuration for db-probe.
//!
//! Loads connection parameters from a properties file and builds the
//! driver-specific connection string for the selected backend.

use crate::db::DatabaseBackend;
use crate::error::{ProbeError, Result};
use crate::properties::Properties;
use std::path::Path;
use tracing::{error, info, warn};
use url::Url;

/// Property keys recognized in the properties file.
pub mod keys {
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
    pub const DATABASE: &str = "DB";
    pub const USER: &str = "USER";
    pub const PASSWORD: &str = "PASS";
    pub const BACKEND: &str = "BACKEND";
    pub const TRUST_CERT: &str = "TRUST_CERT";
}

/// Database connection configuration.
///
/// Every field read from the file is kept as the raw string so that a missing
/// key surfaces as a connection failure rather than a load failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Driver used to open the connection.
    pub backend: DatabaseBackend,

    /// Database host.
    pub host: String,

    /// Database port. Empty means the backend's default port.
    pub port: String,

    /// Database name (a file path for SQLite).
    pub database: String,

    /// Database user.
    pub user: String,

    /// Database password.
    pub password: String,

    /// Accept the server certificate without validation (SQL Server only).
    pub trust_cert: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            host: String::new(),
            port: String::new(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
            trust_cert: true,
        }
    }
}

impl ConnectionConfig {
    /// Extracts the recognized keys from parsed properties. Unknown keys are
    /// ignored and absent keys become empty strings.
    pub fn from_properties(props: &Properties) -> Self {
        let backend = match props.get(keys::BACKEND).map(str::trim) {
            None | Some("") => DatabaseBackend::default(),
            Some(name) => DatabaseBackend::parse(name).unwrap_or_else(|| {
                warn!(
                    "Unknown {} '{}', using {}",
                    keys::BACKEND,
                    name,
                    DatabaseBackend::default().as_str()
                );
                DatabaseBackend::default()
            }),
        };

        let trust_cert = match props.get(keys::TRUST_CERT).map(str::trim) {
            None | Some("") => true,
            Some(v) => !matches!(v.to_lowercase().as_str(), "false" | "no" | "0"),
        };

        Self {
            backend,
            host: props.get_or_empty(keys::HOST),
            port: props.get_or_empty(keys::PORT),
            database: props.get_or_empty(keys::DATABASE),
            user: props.get_or_empty(keys::USER),
            password: props.get_or_empty(keys::PASSWORD),
            trust_cert,
        }
    }

    /// Loads configuration from a properties file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| ProbeError::read(path, e))?;
        Ok(Self::from_properties(&Properties::from_bytes(bytes)))
    }

    /// Loads configuration from a properties file, falling back to an empty
    /// configuration if the file cannot be read.
    pub fn load_or_default(path: &Path) -> Self {
        info!("Reading properties file {}", path.display());
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e.report());
                Self::default()
            }
        }
    }

    /// Checks the fields needed to open a connection.
    pub fn validate(&self) -> Result<()> {
        if self.backend != DatabaseBackend::Sqlite && self.host.trim().is_empty() {
            return Err(ProbeError::connection(format!(
                "No host configured (set {} in the properties file)",
                keys::HOST
            )));
        }
        if self.database.trim().is_empty() {
            return Err(ProbeError::connection(format!(
                "No database configured (set {} in the properties file)",
                keys::DATABASE
            )));
        }
        self.port_number()?;
        Ok(())
    }

    /// Returns the configured port, or the backend default when unset.
    pub fn port_number(&self) -> Result<u16> {
        let port = self.port.trim();
        if port.is_empty() {
            return Ok(self.backend.default_port());
        }
        port.parse()
            .map_err(|_| ProbeError::connection(format!("Invalid port '{port}'")))
    }

    /// Builds the connection string for the configured backend.
    pub fn to_connection_string(&self) -> Result<String> {
        self.connection_string_with_password(&self.password)
    }

    /// Builds the connection string with the password masked, for logging.
    pub fn redacted_connection_string(&self) -> Result<String> {
        if self.password.is_empty() {
            self.to_connection_string()
        } else {
            self.connection_string_with_password("*****")
        }
    }

    fn connection_string_with_password(&self, password: &str) -> Result<String> {
        let port = self.port_number()?;
        match self.backend {
            DatabaseBackend::SqlServer => Ok(format!(
                "server=tcp:{},{};database={};user id={};password={};TrustServerCertificate={}",
                self.host.trim(),
                port,
                ado_quote(self.database.trim()),
                ado_quote(&self.user),
                ado_quote(password),
                self.trust_cert
            )),
            DatabaseBackend::Postgres => {
                let mut url = Url::parse("postgres://localhost")
                    .map_err(|e| ProbeError::connection_caused_by("Invalid base URL", e))?;
                url.set_host(Some(self.host.trim())).map_err(|e| {
                    ProbeError::connection_caused_by(format!("Invalid host '{}'", self.host.trim()), e)
                })?;
                let _ = url.set_port(Some(port));
                url.set_path(&format!("/{}", self.database.trim()));
                if !self.user.is_empty() {
                    let _ = url.set_username(&self.user);
                    if !password.is_empty() {
                        let _ = url.set_password(Some(password));
                    }
                }
                Ok(url.to_string())
            }
            DatabaseBackend::Sqlite => Ok(format!("sqlite:{}", self.database.trim())),
        }
    }

    /// Returns a display-safe string (no password) for log output.
    pub fn display_string(&self) -> String {
        let database = non_empty_or(&self.database, "<none>");
        match self.backend {
            DatabaseBackend::Sqlite => format!("{database} (sqlite)"),
            backend => {
                let host = non_empty_or(&self.host, "<none>");
                let port = match self.port_number() {
                    Ok(port) => port.to_string(),
                    Err(_) => self.port.clone(),
                };
                format!("{database} @ {host}:{port} ({})", backend.as_str())
            }
        }
    }

    /// Returns the loaded values as `(name, value)` pairs with the password
    /// masked.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let password = if self.password.is_empty() {
            String::new()
        } else {
            "*****".to_string()
        };
        vec![
            ("backend", self.backend.as_str().to_string()),
            ("host", self.host.clone()),
            ("port", self.port.clone()),
            ("db", self.database.clone()),
            ("username", self.user.clone()),
            ("password", password),
        ]
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value.trim()
    }
}

/// Quotes an ADO.NET connection string value when it contains characters
/// that would otherwise be read as syntax.
fn ado_quote(value: &str) -> String {
    if value.contains([';', '=', '\'', '"']) || value != value.trim() {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}
