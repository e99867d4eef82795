//! Error types for trainload
//!
//! Only ingestion, configuration and repository I/O can fail. The calculation
//! modules are total and signal "no data" through zero values and
//! [`TssMethod::None`](crate::types::TssMethod::None).

use thiserror::Error;

/// Errors that can occur at the boundaries of the engine
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse activity payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Unsupported activity source: {0}")]
    UnsupportedSource(String),
}
