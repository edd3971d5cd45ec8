//! Dataset preparation: deduplication, defaults, derived length columns.
//!
//! Every step returns a new table.

use std::collections::HashSet;

use tracing::info;

use super::table::Table;

/// Drop rows identical to an earlier row in every column. First occurrence wins.
pub fn drop_duplicates(table: &Table) -> Table {
    let mut seen: HashSet<Vec<&str>> = HashSet::new();
    let mut out = Table::new(table.columns().iter().cloned());
    for row in table.rows() {
        let key: Vec<&str> = table.columns().iter().map(|c| row.get(c)).collect();
        if seen.insert(key) {
            out.push_row(row.clone());
        }
    }
    out
}

/// Fill absent or empty cells of each `(column, default)` pair.
pub fn fill_missing(table: &Table, defaults: &[(&str, &str)]) -> Table {
    let mut out = table.clone();
    for (column, _) in defaults {
        out.ensure_column(column);
    }
    for row in out.rows_mut() {
        for (column, default) in defaults {
            if row.is_missing(column) {
                row.set(*column, *default);
            }
        }
    }
    out
}

/// Add `target` holding the character count of `source`.
pub fn add_length_column(table: &Table, source: &str, target: &str) -> Table {
    let mut out = table.with_column(target);
    for row in out.rows_mut() {
        let length = row.get(source).chars().count();
        row.set(target, length.to_string());
    }
    out
}

/// Lowercase `column`, then uppercase its first character.
pub fn normalize_capitalized(table: &Table, column: &str) -> Table {
    let mut out = table.clone();
    for row in out.rows_mut() {
        let value = capitalize(row.get(column));
        if !value.is_empty() {
            row.set(column, value);
        }
    }
    out
}

fn capitalize(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn prepare_email_dataset(table: &Table) -> Table {
    let table = drop_duplicates(table);
    let table = fill_missing(
        &table,
        &[
            ("Subject", "No Subject"),
            ("Email_Body", ""),
            ("Category", "Uncategorized"),
        ],
    );
    let table = add_length_column(&table, "Email_Body", "Email_Length");
    let table = normalize_capitalized(&table, "Category");
    info!(rows = table.len(), "Email data preprocessing completed");
    table
}

pub fn prepare_chatbot_dataset(table: &Table) -> Table {
    let table = drop_duplicates(table);
    let table = fill_missing(&table, &[("User_Input", ""), ("AI_Response", "")]);
    let table = add_length_column(&table, "User_Input", "Input_Length");
    let table = add_length_column(&table, "AI_Response", "Response_Length");
    info!(rows = table.len(), "Chatbot data preprocessing completed");
    table
}

pub fn prepare_report_dataset(table: &Table) -> Table {
    let table = drop_duplicates(table);
    let table = fill_missing(
        &table,
        &[
            ("Report_Type", "General"),
            ("Summary", ""),
            ("Key_Findings", ""),
        ],
    );
    let table = add_length_column(&table, "Summary", "Summary_Length");
    let table = add_length_column(&table, "Key_Findings", "Findings_Length");
    let table = normalize_capitalized(&table, "Report_Type");
    info!(rows = table.len(), "Business report data preprocessing completed");
    table
}

/// Default share of rows used for training.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// Split into `(train, test)`: the first `floor(ratio * len)` rows train.
///
/// `ratio` is clamped to `[0, 1]`. No shuffling.
pub fn train_test_split(table: &Table, ratio: f64) -> (Table, Table) {
    let ratio = if ratio.is_nan() { DEFAULT_TRAIN_RATIO } else { ratio.clamp(0.0, 1.0) };
    let train_size = ((ratio * table.len() as f64).floor() as usize).min(table.len());
    (
        table.slice(0..train_size),
        table.slice(train_size..table.len()),
    )
}
