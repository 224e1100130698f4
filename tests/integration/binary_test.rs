//! Exit codes and output of the `probe` binary.

use std::process::{Command, Output};

use super::common::Fixture;

fn run_binary(args: &[String]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_probe"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("PROBE_QUERY_TIMEOUT")
        .output()
        .unwrap()
}

#[test]
fn test_missing_flags_exit_with_usage() {
    let output = run_binary(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--query"));
    assert!(stderr.contains("--properties"));
}

#[test]
fn test_help_exits_cleanly() {
    let output = run_binary(&["--help".to_string()]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[test]
fn test_missing_properties_file_exits_with_failure() {
    let fixture = Fixture::sqlite("SELECT 1\n");
    std::fs::remove_file(&fixture.properties).unwrap();

    let output = run_binary(&fixture.args());

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cannot connect to database"));
}

#[test]
fn test_sqlite_run_prints_rows() {
    let fixture = Fixture::sqlite("SELEC broken\nSELECT 1 AS x\n");

    let output = run_binary(&fixture.args());

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Row 1\n  x: 1 (integer)\n"));
    assert!(stdout.contains("Preparing statement: SELEC broken"));
}

#[test]
fn test_verbose_run_reuses_the_open_connection() {
    let fixture = Fixture::sqlite("SELECT 1 AS x\nSELECT 2 AS y\n");
    let mut args = fixture.args();
    args.push("-v".to_string());

    let output = run_binary(&args);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Connected already"));
    assert!(stdout.contains("Row 1\n  y: 2 (integer)\n"));
}

#[test]
fn test_timed_out_statement_is_logged_and_run_continues() {
    let fixture = Fixture::sqlite(
        "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 100000000) \
         SELECT count(*) FROM c\nSELECT 1 AS x\n",
    );
    let mut args = fixture.args();
    args.extend(["--timeout".to_string(), "1".to_string()]);

    let output = run_binary(&args);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Query timed out after 1 seconds"));
    assert!(stdout.contains("Row 1\n  x: 1 (integer)\n"));
}
