//! Shared file helpers for the JSON registries
//!
//! Registries are always rewritten whole: read, edit in memory, write the
//! full document back. A copy of the previous file goes to the backups
//! directory before any mutation.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RegistryError, RegistryResult};

/// Read and parse a JSON file, `None` if it does not exist
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> RegistryResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| RegistryError::io(path, &e))?;
    let value = serde_json::from_str(&content).map_err(|e| RegistryError::json(path, &e))?;
    Ok(Some(value))
}

/// Pretty-print a value to a JSON file, creating parent directories
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, &e))?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|e| RegistryError::json(path, &e))?;
    fs::write(path, content).map_err(|e| RegistryError::io(path, &e))
}

/// Copy the current file into the backups directory before a rewrite
///
/// Returns the backup id, or `None` when there is nothing to back up.
pub(crate) fn backup_before_write(
    backups_dir: &Path,
    path: &Path,
) -> RegistryResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    fs::create_dir_all(backups_dir).map_err(|e| RegistryError::io(backups_dir, &e))?;

    let backup_id = uuid::Uuid::new_v4().to_string();
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let file_name = path
        .file_name()
        .map_or_else(|| "registry".to_string(), |n| n.to_string_lossy().to_string());
    let backup_name = format!("{file_name}_{timestamp}.{}.bak", &backup_id[..8]);

    fs::copy(path, backups_dir.join(backup_name)).map_err(|e| {
        RegistryError::BackupFailed(format!("Failed to backup {}: {e}", path.display()))
    })?;

    Ok(Some(backup_id))
}
