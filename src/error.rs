//! Error types for commflow.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    /// The provider reported failure through its reply text instead of an error.
    #[error("Provider returned an error reply: {0}")]
    Sentinel(String),
}

/// Named-entity recognizer errors.
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("Recognizer {name} unavailable: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("Recognizer {name} failed: {reason}")]
    Failed { name: String, reason: String },
}

/// Errors raised while processing a unit of work (one batch row, one request).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Entity recognition failed: {0}")]
    Recognizer(#[from] RecognizerError),

    #[error("Could not parse model reply: {0}")]
    Parse(String),

    #[error("Row processing failed: {0}")]
    Row(String),
}

/// Tabular input/output errors.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Line {line}: expected a JSON object")]
    NotAnObject { line: usize },

    #[error("Line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
