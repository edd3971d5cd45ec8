//! Minimal string table with JSON Lines input and output.
//!
//! Each line of a JSONL file is one row object. Strings are kept as is,
//! numbers and booleans are stored as their JSON text, `null` counts as a
//! missing cell. Column order is the order of first appearance.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// One record. Absent cells read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchRow {
    cells: BTreeMap<String, String>,
}

impl BatchRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Cell value, or `""` when the cell is absent.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    /// Absent or empty.
    pub fn is_missing(&self, column: &str) -> bool {
        self.cells.get(column).is_none_or(|v| v.is_empty())
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn cells(&self) -> &BTreeMap<String, String> {
        &self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<BatchRow>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, registering any columns it introduces.
    pub fn push_row(&mut self, row: BatchRow) {
        for column in row.cells.keys() {
            self.ensure_column(column);
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [BatchRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// A copy of this table with `column` added. `self` is left untouched.
    pub fn with_column(&self, column: &str) -> Table {
        let mut table = self.clone();
        table.ensure_column(column);
        table
    }

    /// Cell in `column` of row `index`. Fails for an unknown column.
    pub fn cell(&self, index: usize, column: &str) -> Result<&str, TableError> {
        if !self.has_column(column) {
            return Err(TableError::UnknownColumn(column.to_string()));
        }
        Ok(self.rows.get(index).map(|row| row.get(column)).unwrap_or(""))
    }

    /// Set a cell, adding the column when needed.
    pub fn set(&mut self, index: usize, column: &str, value: impl Into<String>) {
        self.ensure_column(column);
        if let Some(row) = self.rows.get_mut(index) {
            row.set(column, value);
        }
    }

    /// Rows `range`, keeping all columns.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows[range].to_vec(),
        }
    }

    pub(crate) fn ensure_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }

    // ── JSON Lines ──────────────────────────────────────────────────

    pub fn from_jsonl_str(input: &str) -> Result<Table, TableError> {
        Self::read_jsonl(input.as_bytes())
    }

    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Table, TableError> {
        let file = fs::File::open(path)?;
        Self::read_jsonl(BufReader::new(file))
    }

    /// Read rows; blank lines are skipped. Line numbers in errors are 1-based.
    pub fn read_jsonl(reader: impl BufRead) -> Result<Table, TableError> {
        let mut table = Table::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let value: serde_json::Value = serde_json::from_str(&line).map_err(|source| {
                TableError::Json {
                    line: line_no,
                    source,
                }
            })?;
            let serde_json::Value::Object(object) = value else {
                return Err(TableError::NotAnObject { line: line_no });
            };

            let mut row = BatchRow::new();
            for (key, value) in object {
                let cell = match value {
                    serde_json::Value::Null => {
                        table.ensure_column(&key);
                        continue;
                    }
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                row.set(key, cell);
            }
            table.push_row(row);
        }
        Ok(table)
    }

    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_jsonl(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// One object per row. Absent cells are written as empty strings.
    pub fn write_jsonl(&self, mut writer: impl Write) -> Result<(), TableError> {
        for row in &self.rows {
            let object: serde_json::Map<String, serde_json::Value> = self
                .columns
                .iter()
                .map(|c| (c.clone(), serde_json::Value::String(row.get(c).to_string())))
                .collect();
            serde_json::to_writer(&mut writer, &object).map_err(std::io::Error::from)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn to_jsonl_string(&self) -> Result<String, TableError> {
        let mut buffer = Vec::new();
        self.write_jsonl(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
