//! Integration tests for db-probe.

pub mod binary_test;
pub mod common;
pub mod config_test;
pub mod run_test;
pub mod sqlserver_test;
