//! Sequential per-row batch processing with failure isolation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::table::{BatchRow, Table};
use crate::error::PipelineError;

/// Prefix of the value written into every output cell of a failed row.
pub const ERROR_MARKER_PREFIX: &str = "ERROR: ";

/// A failed row, with any output cells it finished before failing.
#[derive(Debug)]
pub struct RowFailure {
    pub completed: Vec<(String, String)>,
    pub error: PipelineError,
}

impl RowFailure {
    pub fn with_completed(completed: Vec<(String, String)>, error: PipelineError) -> Self {
        Self { completed, error }
    }
}

impl From<PipelineError> for RowFailure {
    fn from(error: PipelineError) -> Self {
        Self {
            completed: Vec::new(),
            error,
        }
    }
}

/// Per-row logic plugged into the orchestrator.
#[async_trait]
pub trait RowHandler: Send {
    /// Singular noun for progress logs ("email", "conversation", ...).
    fn kind(&self) -> &str;

    /// Columns this handler fills, in output order.
    fn output_columns(&self) -> Vec<String>;

    /// Called before every row. Handlers with per-row state reset it here.
    fn reset(&mut self) {}

    /// Produce `(column, value)` pairs for one row.
    async fn handle(&mut self, row: &BatchRow) -> Result<Vec<(String, String)>, RowFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Ok { row: usize },
    Failed { row: usize, error: String },
}

impl RowOutcome {
    pub fn row(&self) -> usize {
        match self {
            Self::Ok { row } | Self::Failed { row, .. } => *row,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// The derived table plus one outcome per input row, in row order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub table: Table,
    pub outcomes: Vec<RowOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Drives a `RowHandler` over a table, one row at a time in table order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOrchestrator;

impl BatchOrchestrator {
    pub fn new() -> Self {
        Self
    }

    /// Process every row of `input`.
    ///
    /// The input is never modified; the report holds a copy with the
    /// handler's output columns added. A failing row keeps the cells it
    /// completed, gets `ERROR: {message}` in the rest of its output columns,
    /// and processing moves on.
    pub async fn process_batch<H>(&self, input: &Table, handler: &mut H) -> BatchReport
    where
        H: RowHandler + ?Sized,
    {
        let started_at = Utc::now();
        let columns = handler.output_columns();
        let mut table = input.clone();
        for column in &columns {
            table = table.with_column(column);
        }

        let total = input.len();
        let kind = handler.kind().to_string();
        info!(kind = %kind, total, "Processing batch");

        let mut outcomes = Vec::with_capacity(total);
        for (index, row) in input.rows().iter().enumerate() {
            handler.reset();
            match handler.handle(row).await {
                Ok(cells) => {
                    for (column, value) in cells {
                        table.set(index, &column, value);
                    }
                    outcomes.push(RowOutcome::Ok { row: index });
                }
                Err(RowFailure { completed, error: e }) => {
                    error!(kind = %kind, row = index + 1, error = %e, "Failed to process row");
                    let marker = format!("{ERROR_MARKER_PREFIX}{e}");
                    for column in &columns {
                        if !completed.iter().any(|(done, _)| done == column) {
                            table.set(index, column, marker.clone());
                        }
                    }
                    for (column, value) in completed {
                        table.set(index, &column, value);
                    }
                    outcomes.push(RowOutcome::Failed {
                        row: index,
                        error: e.to_string(),
                    });
                }
            }
            info!("Processed {kind} {}/{total}", index + 1);
        }

        let report = BatchReport {
            table,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            kind = %kind,
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = report.elapsed_ms(),
            "Batch processing complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Upper-cases `Text`; fails on rows whose text is `"boom"`, and on
    /// `"half"` after finishing `Loud`.
    struct ShoutHandler {
        resets: usize,
        seen: Vec<String>,
    }

    #[async_trait]
    impl RowHandler for ShoutHandler {
        fn kind(&self) -> &str {
            "shout"
        }

        fn output_columns(&self) -> Vec<String> {
            vec!["Loud".into(), "Length".into()]
        }

        fn reset(&mut self) {
            self.resets += 1;
        }

        async fn handle(&mut self, row: &BatchRow) -> Result<Vec<(String, String)>, RowFailure> {
            let text = row.get("Text");
            self.seen.push(text.to_string());
            if text == "boom" {
                return Err(PipelineError::Row("exploded".into()).into());
            }
            if text == "half" {
                return Err(RowFailure::with_completed(
                    vec![("Loud".into(), "HALF".into())],
                    PipelineError::Row("no length".into()),
                ));
            }
            Ok(vec![
                ("Loud".into(), text.to_uppercase()),
                ("Length".into(), text.len().to_string()),
            ])
        }
    }

    fn input(texts: &[&str]) -> Table {
        let mut table = Table::new(["Text"]);
        for text in texts {
            table.push_row(BatchRow::from_pairs([("Text", *text)]));
        }
        table
    }

    #[tokio::test]
    async fn failing_row_is_isolated() {
        let input = input(&["one", "boom", "three"]);
        let mut handler = ShoutHandler { resets: 0, seen: vec![] };

        let report = BatchOrchestrator::new().process_batch(&input, &mut handler).await;

        assert_eq!(report.table.len(), 3);
        assert_eq!(report.table.rows()[0].get("Loud"), "ONE");
        assert_eq!(report.table.rows()[2].get("Loud"), "THREE");
        assert_eq!(report.table.rows()[2].get("Length"), "5");

        let failed = &report.table.rows()[1];
        assert_eq!(failed.get("Loud"), "ERROR: Row processing failed: exploded");
        assert_eq!(failed.get("Length"), "ERROR: Row processing failed: exploded");
        assert_eq!(failed.get("Text"), "boom");

        assert_eq!(
            report.outcomes,
            vec![
                RowOutcome::Ok { row: 0 },
                RowOutcome::Failed {
                    row: 1,
                    error: "Row processing failed: exploded".into()
                },
                RowOutcome::Ok { row: 2 },
            ]
        );
        assert_eq!((report.succeeded(), report.failed()), (2, 1));
        assert_eq!(report.failures().next().map(RowOutcome::row), Some(1));
    }

    #[tokio::test]
    async fn completed_cells_survive_a_row_failure() {
        let input = input(&["half"]);
        let mut handler = ShoutHandler { resets: 0, seen: vec![] };
        let report = BatchOrchestrator::new().process_batch(&input, &mut handler).await;

        let row = &report.table.rows()[0];
        assert_eq!(row.get("Loud"), "HALF");
        assert_eq!(row.get("Length"), "ERROR: Row processing failed: no length");
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn rows_run_in_order_with_reset_before_each() {
        let input = input(&["a", "b", "c", "d"]);
        let mut handler = ShoutHandler { resets: 0, seen: vec![] };
        BatchOrchestrator::new().process_batch(&input, &mut handler).await;

        assert_eq!(handler.seen, vec!["a", "b", "c", "d"]);
        assert_eq!(handler.resets, 4);
    }

    #[tokio::test]
    async fn input_table_is_not_modified() {
        let input = input(&["x"]);
        let before = input.clone();
        let mut handler = ShoutHandler { resets: 0, seen: vec![] };
        let report = BatchOrchestrator::new().process_batch(&input, &mut handler).await;

        assert_eq!(input, before);
        assert_eq!(report.table.columns(), &["Text", "Loud", "Length"]);
    }

    #[tokio::test]
    async fn missing_fields_read_as_empty() {
        let mut table = Table::new(["Text"]);
        table.push_row(BatchRow::new());
        let mut handler = ShoutHandler { resets: 0, seen: vec![] };
        let report = BatchOrchestrator::new().process_batch(&table, &mut handler).await;

        assert_eq!(report.outcomes, vec![RowOutcome::Ok { row: 0 }]);
        assert_eq!(report.table.rows()[0].get("Length"), "0");
    }

    #[tokio::test]
    async fn empty_batch() {
        let mut handler = ShoutHandler { resets: 0, seen: vec![] };
        let report = BatchOrchestrator::new().process_batch(&Table::new(["Text"]), &mut handler).await;
        assert!(report.table.is_empty());
        assert!(report.outcomes.is_empty());
        assert_eq!(handler.resets, 0);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(RowOutcome::Failed { row: 3, error: "x".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "row": 3, "error": "x"}));
    }
}
