//! Profile file storage
//!
//! One JSON document per profile at `<root>/.loadout/profiles/<name>.json`.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use loadout_registry::Paths;
use tracing::debug;

use super::types::Profile;
use crate::error::{CoreError, CoreResult};

/// Validate a profile name for use as a file stem
///
/// # Errors
/// Returns an error for empty names, path separators, `..`, leading dots,
/// or null bytes.
pub fn validate_name(name: &str) -> CoreResult<()> {
    let reason = if name.is_empty() {
        Some("name cannot be empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("name cannot contain path separators")
    } else if name.contains("..") {
        Some("name cannot contain '..'")
    } else if name.starts_with('.') {
        Some("name cannot start with '.'")
    } else if name.contains('\0') {
        Some("name cannot contain null bytes")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CoreError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Loads and saves profile documents
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Create a store over the profiles directory
    #[must_use]
    pub fn new(paths: &Paths) -> Self {
        Self { dir: paths.profiles_dir() }
    }

    fn profile_path(&self, name: &str) -> CoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Whether a profile exists
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.profile_path(name).is_ok_and(|p| p.exists())
    }

    /// Load a profile by name
    ///
    /// # Errors
    /// Returns `ProfileNotFound` if no such profile, or an I/O or parse
    /// error for a corrupt document.
    pub fn load(&self, name: &str) -> CoreResult<Profile> {
        let path = self.profile_path(name)?;
        if !path.exists() {
            return Err(CoreError::ProfileNotFound(name.to_string()));
        }

        let content = fs::read_to_string(&path).map_err(|e| CoreError::io(&path, &e))?;
        serde_json::from_str(&content).map_err(|e| CoreError::json(&path, &e))
    }

    /// Save a profile, stamping `updated_at`
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the write
    /// fails.
    pub fn save(&self, profile: &mut Profile) -> CoreResult<()> {
        let path = self.profile_path(&profile.name)?;
        fs::create_dir_all(&self.dir).map_err(|e| CoreError::io(&self.dir, &e))?;

        profile.updated_at = Utc::now();
        let content =
            serde_json::to_string_pretty(profile).map_err(|e| CoreError::json(&path, &e))?;
        debug!(profile = %profile.name, path = %path.display(), "saving profile");
        fs::write(&path, content).map_err(|e| CoreError::io(&path, &e))
    }

    /// List profiles in name order
    ///
    /// # Errors
    /// Returns an error if a profile document cannot be read or parsed.
    pub fn list(&self) -> CoreResult<Vec<Profile>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| CoreError::io(&self.dir, &e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::io(&self.dir, &e))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();

        names.iter().map(|name| self.load(name)).collect()
    }

    /// Clone a profile under a new name with fresh timestamps
    ///
    /// # Errors
    /// Returns `ProfileExists` if the destination is taken, or an I/O
    /// error from the underlying load/save.
    pub fn clone_profile(&self, source: &str, dest: &str) -> CoreResult<Profile> {
        validate_name(dest)?;
        if self.exists(dest) {
            return Err(CoreError::ProfileExists(dest.to_string()));
        }

        let mut profile = self.load(source)?;
        profile.name = dest.to_string();
        let now = Utc::now();
        profile.created_at = now;
        profile.updated_at = now;
        self.save(&mut profile)?;
        Ok(profile)
    }

    /// Delete a profile
    ///
    /// # Errors
    /// Returns `ProfileNotFound` if no such profile, or an I/O error.
    pub fn delete(&self, name: &str) -> CoreResult<()> {
        let path = self.profile_path(name)?;
        if !path.exists() {
            return Err(CoreError::ProfileNotFound(name.to_string()));
        }
        fs::remove_file(&path).map_err(|e| CoreError::io(&path, &e))
    }
}
