//! Error types for ptrain

use std::io;
use thiserror::Error;

/// Main error type for ptrain
#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Not supported by this speech backend: {0}")]
    Unsupported(&'static str),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ptrain operations
pub type Result<T> = std::result::Result<T, TrainerError>;

impl From<String> for TrainerError {
    fn from(s: String) -> Self {
        TrainerError::Other(s)
    }
}

impl From<&str> for TrainerError {
    fn from(s: &str) -> Self {
        TrainerError::Other(s.to_string())
    }
}
