//! db-probe - run ad-hoc SQL statements from a file and dump the results.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod logging;
pub mod properties;
pub mod queries;
pub mod query;
