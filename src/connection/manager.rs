//! Connection manager owning the single database connection for a run.

use crate::config::ConnectionConfig;
use crate::db::DatabaseClient;
use crate::error::Result;
use tracing::{debug, info, warn};

/// Owns the connection configuration and, once opened, the live connection.
///
/// The connection is opened lazily by [`ConnectionManager::connect`] and kept
/// for the rest of the run. Connection failures are returned to the caller;
/// deciding whether to abort is left to the entry point.
pub struct ConnectionManager {
    config: ConnectionConfig,
    active: Option<Box<dyn DatabaseClient>>,
}

impl ConnectionManager {
    /// Creates a manager that has not connected yet.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Returns the open connection, connecting first if needed.
    ///
    /// Calling this while connected returns the existing connection unchanged.
    pub async fn connect(&mut self) -> Result<&mut (dyn DatabaseClient + 'static)> {
        let db = match self.active.take() {
            Some(db) => {
                debug!("Connected already");
                db
            }
            None => {
                match self.config.redacted_connection_string() {
                    Ok(conn_str) => info!("DB connection string: {}", conn_str),
                    Err(e) => debug!("Cannot render connection string: {}", e),
                }

                let db = crate::db::connect(&self.config).await?;
                info!("Connected to {}", self.config.display_string());
                db
            }
        };

        Ok(&mut **self.active.insert(db))
    }

    /// Drops the connection without a graceful close, for when it is stuck or
    /// broken. The next [`ConnectionManager::connect`] opens a fresh one.
    pub fn discard(&mut self) {
        if self.active.take().is_some() {
            warn!("Dropped the connection; the next statement reconnects");
        }
    }

    /// Close the active connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut db) = self.active.take() {
            db.close().await?;
            debug!("Connection closed");
        }
        Ok(())
    }
}
