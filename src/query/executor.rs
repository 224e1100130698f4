//! Sequential statement execution.
//!
//! Runs each statement over the manager's single connection and writes its
//! result-set dump. A failing statement is logged and the run moves on.

use std::io::Write;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::connection::ConnectionManager;
use crate::error::{ProbeError, Result};
use crate::queries::QueryList;
use crate::query::DumpWriter;

/// Executes statements and prints their results to `out`.
pub struct QueryExecutor<'a, W: Write + Send> {
    manager: &'a mut ConnectionManager,
    out: W,
    timeout: Option<Duration>,
}

impl<'a, W: Write + Send> QueryExecutor<'a, W> {
    /// Creates a new query executor writing dumps to `out`.
    pub fn new(manager: &'a mut ConnectionManager, out: W) -> Self {
        Self {
            manager,
            out,
            timeout: None,
        }
    }

    /// Fails any statement that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Executes one statement verbatim, printing rows as they arrive.
    /// Returns the number of rows printed.
    ///
    /// A statement that times out or loses the connection leaves it in an
    /// unknown state, so the connection is dropped and the next statement
    /// reconnects.
    pub async fn execute(&mut self, sql: &str) -> Result<usize> {
        info!("Preparing statement: {}", sql);
        let db = self.manager.connect().await?;

        info!("Executing statement: {}", sql);
        let start = Instant::now();
        let mut dump = DumpWriter::new(&mut self.out);

        let running = db.execute_query(sql, &mut dump);
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, running)
                .await
                .unwrap_or(Err(ProbeError::Timeout(limit))),
            None => running.await,
        };
        let rows = dump.rows_written();

        match outcome {
            Ok(()) => {
                info!("{} row(s) in {:?}", rows, start.elapsed());
                Ok(rows)
            }
            Err(e) => {
                if matches!(e, ProbeError::Timeout(_) | ProbeError::Connection { .. }) {
                    self.manager.discard();
                }
                if rows > 0 {
                    info!("{} row(s) printed before the failure", rows);
                }
                Err(e)
            }
        }
    }

    /// Executes every statement in order. Per-statement failures are logged
    /// and do not stop the run.
    pub async fn run_all(&mut self, queries: &QueryList) -> RunSummary {
        let mut summary = RunSummary::default();

        for sql in queries.iter() {
            summary.executed += 1;
            match self.execute(sql).await {
                Ok(rows) => {
                    summary.succeeded += 1;
                    summary.rows += rows;
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("{}", e.report());
                }
            }
        }

        summary
    }
}

/// Counts for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Rows printed by successful statements.
    pub rows: usize,
}
