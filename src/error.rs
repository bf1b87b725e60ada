//! Oracle Error Types
//!
//! Centralized error handling for the assistant.

use thiserror::Error;

/// Central error type for Oracle
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("ASR engine error: {0}")]
    Asr(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Audio capture error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Oracle operations
pub type OracleResult<T> = Result<T, OracleError>;
