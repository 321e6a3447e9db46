//! Error types for the crossword construction system.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid construction and mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Grid dimensions must be positive, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("Row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid cell {value:?} at ({row}, {col})")]
    InvalidCell { row: usize, col: usize, value: String },

    #[error("Cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },

    #[error("Cell ({row}, {col}) is black")]
    BlackCell { row: usize, col: usize },

    #[error("Cell ({row}, {col}) already holds {existing}, cannot place {incoming}")]
    LetterConflict {
        row: usize,
        col: usize,
        existing: char,
        incoming: char,
    },

    #[error("Cell ({row}, {col}) has no letter")]
    Unfilled { row: usize, col: usize },

    #[error("Answer {text:?} contains no letters")]
    EmptyAnswer { text: String },
}

/// Typed failure returned by a generation collaborator.
///
/// Every variant counts against the stage's retry budget; none is special-cased.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum GenerationError {
    #[error("Generation timed out: {0}")]
    Timeout(String),

    #[error("Malformed generation response: {0}")]
    Malformed(String),

    #[error("Generation rejected: {0}")]
    Rejected(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Timeout(_) => "timeout",
            GenerationError::Malformed(_) => "malformed",
            GenerationError::Rejected(_) => "rejected",
        }
    }
}

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job {0} is already terminal")]
    JobTerminal(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Record encoding error: {0}")]
    Encoding(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Crate-level errors surfaced through the service, CLI and config layers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Construction service is not running")]
    ServiceStopped,

    #[error("Timed out waiting for job {0}")]
    WaitTimeout(String),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider request timed out: {0}")]
    ProviderTimeout(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ConfigError(format!("Invalid JSON: {}", err))
    }
}
