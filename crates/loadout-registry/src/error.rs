//! Error types for registry operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while reading or rewriting registry files
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Home directory not found
    #[error("Home directory not found")]
    HomeNotFound,

    /// File I/O error
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// JSON parse error
    #[error("JSON parse error in {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    /// A registry document did not have the expected shape
    #[error("Malformed registry {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Invalid plugin key
    #[error("Invalid plugin key: {0}")]
    InvalidKey(String),

    /// Backup creation failed
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
}

impl RegistryError {
    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn json(path: &std::path::Path, err: &serde_json::Error) -> Self {
        Self::JsonParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
