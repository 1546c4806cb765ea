//! Path resolution for managed state
//!
//! Every file this tool touches is derived from a single root directory,
//! which defaults to the user's home and can be overridden with the
//! global `--config-dir` flag.

use std::path::{Path, PathBuf};

use crate::error::{RegistryError, RegistryResult};

/// Resolved locations of all managed files
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Resolve paths from an optional alternate root
    ///
    /// # Errors
    /// Returns an error if no override is given and the home directory
    /// cannot be determined.
    pub fn resolve(config_dir: Option<PathBuf>) -> RegistryResult<Self> {
        let root = match config_dir {
            Some(dir) => dir,
            None => dirs::home_dir().ok_or(RegistryError::HomeNotFound)?,
        };
        Ok(Self { root })
    }

    /// Root directory all other paths hang off
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Client config bearing the MCP server map (`~/.claude.json`)
    #[must_use]
    pub fn client_config_file(&self) -> PathBuf {
        self.root.join(".claude.json")
    }

    /// Claude plugins directory (`~/.claude/plugins`)
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(".claude").join("plugins")
    }

    /// Installed-plugin registry
    #[must_use]
    pub fn installed_plugins_file(&self) -> PathBuf {
        self.plugins_dir().join("installed_plugins.json")
    }

    /// Known-marketplace registry
    #[must_use]
    pub fn known_marketplaces_file(&self) -> PathBuf {
        self.plugins_dir().join("known_marketplaces.json")
    }

    /// Settings file carrying the `enabledPlugins` map
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.root.join(".claude").join("settings.json")
    }

    /// Directory holding profile documents
    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join(".loadout").join("profiles")
    }

    /// Active-profile state file
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.root.join(".loadout").join("state.json")
    }

    /// Directory for pre-write registry backups
    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(".loadout").join("backups")
    }
}
