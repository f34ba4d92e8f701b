//! Error types for the Rage Tracker engine

use thiserror::Error;

/// Errors that can occur while configuring or driving the engine
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid frame record at index {index}: {reason}")]
    InvalidFrame { index: usize, reason: String },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
