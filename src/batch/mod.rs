//! Tabular batch processing.
//!
//! - `table`: string table with JSON Lines I/O
//! - `dataset`: cleanup and feature columns before a batch runs
//! - `orchestrator`: per-row driver with failure isolation
//! - `handlers`: email, conversation and report row logic

pub mod dataset;
pub mod handlers;
pub mod orchestrator;
pub mod table;

pub use handlers::{ConversationRowHandler, EmailRowHandler, ReportRowHandler};
pub use orchestrator::{
    BatchOrchestrator, BatchReport, ERROR_MARKER_PREFIX, RowFailure, RowHandler, RowOutcome,
};
pub use table::{BatchRow, Table};
