//! Top-level run sequence for db-probe.
//!
//! Loads the properties and query files, opens the connection, then executes
//! every statement in order over that one connection.

use std::io::Write;

use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::ConnectionConfig;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::queries::QueryList;
use crate::query::{QueryExecutor, RunSummary};

/// Runs the probe, printing result dumps to stdout.
pub async fn run(cli: &Cli) -> Result<RunSummary> {
    run_with_output(cli, std::io::stdout()).await
}

/// Runs the probe, printing result dumps to `out`.
///
/// Only a connection failure is returned as an error; unreadable input files
/// and failing statements are logged and the run continues.
pub async fn run_with_output<W: Write + Send>(cli: &Cli, out: W) -> Result<RunSummary> {
    info!("Properties file path: {}", cli.properties.display());
    info!("Query file path: {}", cli.query.display());

    let config = ConnectionConfig::load_or_default(&cli.properties);
    let queries = QueryList::load_or_empty(&cli.query);

    for (key, value) in config.summary() {
        info!("{} = {}", key, value);
    }
    info!("{} statement(s) to execute", queries.len());

    let mut manager = ConnectionManager::new(config);
    info!("Connecting to the database");
    manager.connect().await?;

    info!("Executing SQL queries");
    let summary = QueryExecutor::new(&mut manager, out)
        .with_timeout(cli.query_timeout())
        .run_all(&queries)
        .await;

    if let Err(e) = manager.close().await {
        warn!("{}", e.report());
    }

    info!(
        "Finished: {} executed, {} succeeded, {} failed, {} row(s)",
        summary.executed, summary.succeeded, summary.failed, summary.rows
    );
    Ok(summary)
}
