//! Error types for Extract operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a scan before or instead of producing a `ScanResult`.
///
/// Per-file problems are never reported through this type; they end up as
/// [`RejectedFile`](crate::RejectedFile) entries in the result.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid scan root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl ExtractError {
    pub(crate) fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ExtractError::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for Extract operations
pub type Result<T> = std::result::Result<T, ExtractError>;

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        ExtractError::Serialization(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for ExtractError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        ExtractError::ThreadPool(e.to_string())
    }
}
