//! Live SQL Server tests.
//!
//! Skipped unless MSSQL_HOST is set. MSSQL_PORT, MSSQL_DB, MSSQL_USER and
//! MSSQL_PASS fill in the rest of the properties file.

use db_probe::app;
use pretty_assertions::assert_eq;

use super::common::Fixture;

fn live_properties() -> Option<String> {
    let host = std::env::var("MSSQL_HOST").ok()?;
    let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.into());

    Some(format!(
        "HOST={}\nPORT={}\nDB={}\nUSER={}\nPASS={}\n",
        host,
        var("MSSQL_PORT", "1433"),
        var("MSSQL_DB", "master"),
        var("MSSQL_USER", "sa"),
        var("MSSQL_PASS", ""),
    ))
}

#[tokio::test]
async fn test_sqlserver_literal_select() {
    let Some(properties) = live_properties() else {
        eprintln!("MSSQL_HOST not set, skipping");
        return;
    };
    let fixture = Fixture::new(&properties, "SELECT 1 AS x, N'abc' AS s, NULL AS n\n");

    let mut out = Vec::new();
    let summary = app::run_with_output(&fixture.cli(), &mut out)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Row 1\n  x: 1 (integer)\n  s: abc (text)\n  n:  (null)\n"
    );
}

#[tokio::test]
async fn test_sqlserver_bad_statement_then_good() {
    let Some(properties) = live_properties() else {
        eprintln!("MSSQL_HOST not set, skipping");
        return;
    };
    let fixture = Fixture::new(&properties, "SELEC 1\nSELECT 2 AS y\n");

    let mut out = Vec::new();
    let summary = app::run_with_output(&fixture.cli(), &mut out)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(String::from_utf8(out).unwrap(), "Row 1\n  y: 2 (integer)\n");
}

#[tokio::test]
async fn test_sqlserver_wrong_password_is_a_connection_error() {
    let Some(properties) = live_properties() else {
        eprintln!("MSSQL_HOST not set, skipping");
        return;
    };
    let properties = format!("{properties}PASS=definitely-wrong\n");
    let fixture = Fixture::new(&properties, "SELECT 1\n");

    let result = app::run_with_output(&fixture.cli(), Vec::new()).await;
    assert!(result.is_err());
}
