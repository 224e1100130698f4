//! Plain-text rendering of a result set.
//!
//! Each row is printed as a `Row <n>` header followed by one indented line per
//! column: `  <name>: <value> (<type>)`.

use std::io::Write;

use tracing::debug;

use crate::db::{ColumnInfo, Row, RowSink};
use crate::error::Result;

/// Writes rows to `out` as the driver produces them.
pub struct DumpWriter<W: Write> {
    out: W,
    columns: Vec<String>,
    rows_written: usize,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            columns: Vec::new(),
            rows_written: 0,
        }
    }

    /// Number of row blocks written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn column_name(&self, index: usize) -> String {
        self.columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("column{}", index + 1))
    }
}

impl<W: Write + Send> RowSink for DumpWriter<W> {
    fn columns(&mut self, columns: &[ColumnInfo]) -> Result<()> {
        if !columns.is_empty() {
            let described: Vec<String> = columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect();
            debug!("Result columns: {}", described.join(", "));
        }
        self.columns = columns.iter().map(|c| c.name.clone()).collect();
        Ok(())
    }

    fn row(&mut self, row: Row) -> Result<()> {
        self.rows_written += 1;
        writeln!(self.out, "Row {}", self.rows_written)?;
        for (index, value) in row.iter().enumerate() {
            writeln!(
                self.out,
                "  {}: {} ({})",
                self.column_name(index),
                value.to_display_string(),
                value.type_name()
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}
