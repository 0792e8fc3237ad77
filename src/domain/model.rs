use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const STORE_LOCATION: &str = "STORE_LOCATION";
pub const PRODUCT_ID: &str = "PRODUCT_ID";
pub const MRP: &str = "MRP";
pub const CP: &str = "CP";
pub const DISCOUNT: &str = "DISCOUNT";
pub const SP: &str = "SP";

/// Columns every source file must carry (exact, case-sensitive header names).
pub const REQUIRED_COLUMNS: [&str; 6] = [STORE_LOCATION, PRODUCT_ID, MRP, CP, DISCOUNT, SP];

/// Price-like columns reduced to their digits.
pub const PRICE_COLUMNS: [&str; 4] = [MRP, CP, DISCOUNT, SP];

pub const DEFAULT_TARGET_TABLE: &str = "clean_transaction";

/// In-memory table of untyped string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EtlError::format(format!(
                "row {} has {} fields but the header has {}",
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Concatenates `other` below this table. Both must share the same header.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if self.columns != other.columns {
            return Err(EtlError::format(format!(
                "cannot concatenate tables with different headers: [{}] vs [{}]",
                self.columns.join(","),
                other.columns.join(",")
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<String>] {
        &mut self.rows
    }

    /// Renders the first `limit` rows as a left-aligned text grid for log output.
    pub fn render_preview(&self, limit: usize) -> String {
        let shown = &self.rows[..self.rows.len().min(limit)];
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in shown {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render_line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![render_line(&self.columns)];
        lines.extend(shown.iter().map(|row| render_line(row)));
        lines.join("\n")
    }
}

/// A table whose required columns have been fully normalized.
///
/// Only `core::transform::clean_table` builds one, so a sink that accepts
/// `CleanTable` can never persist a raw or half-cleaned row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTable(Table);

impl CleanTable {
    pub(crate) fn new(table: Table) -> Self {
        Self(table)
    }

    pub fn as_table(&self) -> &Table {
        &self.0
    }

    pub fn into_inner(self) -> Table {
        self.0
    }

    pub fn columns(&self) -> &[String] {
        self.0.columns()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        self.0.rows()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parsed through [`FromStr`] from every source (TOML, environment, flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum WriteMode {
    /// Discard the target table's contents and replace them with the batch.
    Overwrite,
    /// Add the batch to whatever the target table already holds.
    Append,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Overwrite => write!(f, "overwrite"),
            WriteMode::Append => write!(f, "append"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" | "replace" => Ok(WriteMode::Overwrite),
            "append" => Ok(WriteMode::Append),
            other => Err(EtlError::InvalidConfigValueError {
                field: "write_mode".to_string(),
                value: other.to_string(),
                reason: "Expected 'overwrite' or 'append'".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for WriteMode {
    type Error = EtlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Object-store coordinates of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub mode: WriteMode,
    pub rows_written: usize,
    /// Row count after the write, when the read-back succeeded.
    pub total_rows: Option<usize>,
}
