//! Shared error types for the application

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for faultline operations
#[derive(Debug, Error)]
pub enum Error {
    /// Source text could not be parsed at the requested granularity
    #[error("Parse error in {file}:{line}:{column}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Repository history could not be read or enumerated
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Configuration errors (weights, patterns, ranges)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// History contains no bug-fixing commits; calibration output is arbitrary
    #[error("Degenerate history: {0}")]
    DegenerateHistory(String),

    /// Wrapped git errors
    #[error(transparent)]
    Git(#[from] git2::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error with location
    pub fn parse(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
