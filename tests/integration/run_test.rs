//! End-to-end runs through `app::run_with_output`.

use db_probe::app;
use db_probe::error::ProbeError;
use db_probe::query::RunSummary;
use pretty_assertions::assert_eq;

use super::common::Fixture;

async fn run(fixture: &Fixture) -> (Result<RunSummary, ProbeError>, String) {
    let mut out = Vec::new();
    let result = app::run_with_output(&fixture.cli(), &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_single_literal_select() {
    let fixture = Fixture::sqlite("SELECT 1 AS x\n");

    let (result, printed) = run(&fixture).await;

    assert_eq!(
        result.unwrap(),
        RunSummary {
            executed: 1,
            succeeded: 1,
            failed: 0,
            rows: 1,
        }
    );
    assert_eq!(printed, "Row 1\n  x: 1 (integer)\n");
}

#[tokio::test]
async fn test_malformed_statement_then_valid_one() {
    let fixture = Fixture::sqlite("SELEC nothing FROM\nSELECT 1 AS x\n");

    let (result, printed) = run(&fixture).await;

    let summary = result.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(printed, "Row 1\n  x: 1 (integer)\n");
}

#[tokio::test]
async fn test_empty_query_file() {
    let fixture = Fixture::sqlite("");

    let (result, printed) = run(&fixture).await;

    assert_eq!(result.unwrap(), RunSummary::default());
    assert_eq!(printed, "");
}

#[tokio::test]
async fn test_blank_and_comment_lines_are_skipped() {
    let fixture = Fixture::sqlite("\n-- warm up\n   \nSELECT 'hi' AS greeting\n");

    let (result, printed) = run(&fixture).await;

    assert_eq!(result.unwrap().executed, 1);
    assert_eq!(printed, "Row 1\n  greeting: hi (text)\n");
}

#[tokio::test]
async fn test_missing_query_file_runs_nothing() {
    let fixture = Fixture::sqlite("SELECT 1\n");
    std::fs::remove_file(&fixture.queries).unwrap();

    let (result, printed) = run(&fixture).await;

    assert_eq!(result.unwrap().executed, 0);
    assert!(printed.is_empty());
}

#[tokio::test]
async fn test_missing_properties_file_is_a_connection_error() {
    let fixture = Fixture::sqlite("SELECT 1\n");
    std::fs::remove_file(&fixture.properties).unwrap();

    let (result, printed) = run(&fixture).await;

    assert!(matches!(result, Err(ProbeError::Connection { .. })));
    assert!(printed.is_empty());
}

#[tokio::test]
async fn test_rows_and_columns_print_in_order() {
    let fixture = Fixture::sqlite(
        "CREATE TABLE people (id INTEGER, name TEXT, score REAL)\n\
         INSERT INTO people VALUES (1, 'ada', 9.5), (2, 'bob', NULL)\n\
         SELECT id, name, score FROM people ORDER BY id\n",
    );

    let (result, printed) = run(&fixture).await;

    assert_eq!(result.unwrap().succeeded, 3);
    assert_eq!(
        printed,
        "Row 1\n  id: 1 (integer)\n  name: ada (text)\n  score: 9.5 (float)\n\
         Row 2\n  id: 2 (integer)\n  name: bob (text)\n  score:  (null)\n"
    );
}

#[tokio::test]
async fn test_statement_with_no_rows_prints_nothing() {
    let fixture = Fixture::sqlite(
        "CREATE TABLE empty_t (id INTEGER)\nSELECT id FROM empty_t\n",
    );

    let (result, printed) = run(&fixture).await;

    assert_eq!(result.unwrap().succeeded, 2);
    assert_eq!(printed, "");
}
