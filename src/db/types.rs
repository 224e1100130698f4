//! Column and cell types shared by the database backends.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name (the display label, including any alias).
    pub name: String,

    /// Driver-reported column data type.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Exact numeric, kept in its textual form to avoid rounding.
    Decimal(String),

    /// Text/string value.
    Text(String),

    /// Calendar date.
    Date(NaiveDate),

    /// Time of day.
    Time(NaiveTime),

    /// Date and time without a zone.
    Timestamp(NaiveDateTime),

    /// Date and time with a UTC offset.
    TimestampTz(DateTime<FixedOffset>),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the name of the value's kind, as shown next to each cell.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Bytes(_) => "binary",
        }
    }

    /// Converts the value to its display form. NULL displays as an empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(d) => d.clone(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.to_string(),
            Value::Time(t) => t.to_string(),
            Value::Timestamp(ts) => ts.to_string(),
            Value::TimestampTz(ts) => ts.to_rfc3339(),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("0x{hex}")
            }
        }
    }
}

/// Rows collected in memory, so tests can inspect what a statement returned.
#[cfg(test)]
#[derive(Debug, Default, PartialEq)]
pub struct CollectedRows {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
}

#[cfg(test)]
impl super::RowSink for CollectedRows {
    fn columns(&mut self, columns: &[ColumnInfo]) -> crate::error::Result<()> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn row(&mut self, row: Row) -> crate::error::Result<()> {
        self.rows.push(row);
        Ok(())
    }
}
