//! Error types for profile and apply operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the profile engine
#[derive(Debug, Error)]
pub enum CoreError {
    /// Registry layer failure
    #[error(transparent)]
    Registry(#[from] loadout_registry::RegistryError),

    /// Profile not found
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),

    /// Profile already exists
    #[error("Profile '{0}' already exists")]
    ProfileExists(String),

    /// Invalid profile name
    #[error("Invalid profile name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// File I/O error
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// JSON parse error
    #[error("JSON parse error in {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    /// No resolver produced a value for a secret
    #[error("Secret '{name}' could not be resolved (tried: {tried})")]
    SecretUnresolved { name: String, tried: String },

    /// Spawning the external command failed
    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },
}

impl CoreError {
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
