//! Integration tests for db-probe.
//!
//! Most tests run against an in-memory SQLite database and need no server.
//! Live SQL Server tests are skipped unless MSSQL_HOST is set.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
