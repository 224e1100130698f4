//! Statement execution and result rendering.

mod dump;
mod executor;

pub use dump::DumpWriter;
pub use executor::{QueryExecutor, RunSummary};
