//! Installed-plugin registry
//!
//! `~/.claude/plugins/installed_plugins.json` maps plugin keys to install
//! metadata. Entries are created by the external `claude` CLI; this tool
//! only edits and removes them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryResult;
use crate::fsio;
use crate::key::PluginKey;
use crate::paths::Paths;

/// Registry document version written by current Claude Code releases
pub const REGISTRY_VERSION: u32 = 2;

/// Install metadata for one plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginEntry {
    /// Plugin version at install time
    pub version: String,
    /// Where the plugin contents live on disk
    pub install_path: PathBuf,
    /// When the plugin was first installed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
    /// When the plugin was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Marketplace commit the install came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    /// Local checkout rather than a cached marketplace copy
    #[serde(default)]
    pub is_local: bool,
}

/// The installed-plugin registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRegistry {
    /// Document version
    pub version: u32,
    /// Installed plugins, keyed by `name@marketplace`
    #[serde(default)]
    pub plugins: BTreeMap<PluginKey, PluginEntry>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            plugins: BTreeMap::new(),
        }
    }
}

impl PluginRegistry {
    /// Load the registry, empty if the file does not exist
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(paths: &Paths) -> RegistryResult<Self> {
        Ok(fsio::read_json(&paths.installed_plugins_file())?.unwrap_or_default())
    }

    /// Rewrite the whole registry file, backing up the previous copy
    ///
    /// # Errors
    /// Returns an error if the backup or the write fails.
    pub fn save(&self, paths: &Paths) -> RegistryResult<Option<String>> {
        let file = paths.installed_plugins_file();
        let backup_id = fsio::backup_before_write(&paths.backups_dir(), &file)?;
        fsio::write_json(&file, self)?;
        Ok(backup_id)
    }

    /// Iterate installed plugin keys
    pub fn keys(&self) -> impl Iterator<Item = &PluginKey> {
        self.plugins.keys()
    }

    /// Whether a plugin is recorded as installed
    #[must_use]
    pub fn contains(&self, key: &PluginKey) -> bool {
        self.plugins.contains_key(key)
    }

    /// Look up one entry
    #[must_use]
    pub fn get(&self, key: &PluginKey) -> Option<&PluginEntry> {
        self.plugins.get(key)
    }

    /// Remove an entry, returning it if present
    pub fn remove(&mut self, key: &PluginKey) -> Option<PluginEntry> {
        self.plugins.remove(key)
    }

    /// Number of installed plugins
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> Paths {
        Paths::resolve(Some(dir.path().to_path_buf())).unwrap()
    }

    fn write_registry(paths: &Paths, content: &str) {
        let file = paths.installed_plugins_file();
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::load(&paths(&dir)).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.version, REGISTRY_VERSION);
    }

    #[test]
    fn test_load_wire_format() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        write_registry(
            &paths,
            r#"{
                "version": 2,
                "plugins": {
                    "fmt-tools@acme": {
                        "version": "1.2.0",
                        "installPath": "/tmp/plugins/fmt-tools",
                        "commitHash": "abc123",
                        "isLocal": false
                    },
                    "linter@acme": {
                        "version": "0.4.1",
                        "installPath": "/tmp/plugins/linter"
                    }
                }
            }"#,
        );

        let registry = PluginRegistry::load(&paths).unwrap();
        assert_eq!(registry.len(), 2);

        let key = PluginKey::new("fmt-tools", "acme");
        let entry = registry.get(&key).unwrap();
        assert_eq!(entry.version, "1.2.0");
        assert_eq!(entry.commit_hash.as_deref(), Some("abc123"));
        assert!(!entry.is_local);
        assert!(registry.get(&PluginKey::new("linter", "acme")).unwrap().commit_hash.is_none());
    }

    #[test]
    fn test_remove_and_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        write_registry(
            &paths,
            r#"{"version": 2, "plugins": {
                "a@m": {"version": "1.0.0", "installPath": "/tmp/a"},
                "b@m": {"version": "1.0.0", "installPath": "/tmp/b"}
            }}"#,
        );

        let mut registry = PluginRegistry::load(&paths).unwrap();
        assert!(registry.remove(&PluginKey::new("a", "m")).is_some());
        let backup = registry.save(&paths).unwrap();
        assert!(backup.is_some());

        let reloaded = PluginRegistry::load(&paths).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains(&PluginKey::new("b", "m")));
        assert!(!reloaded.contains(&PluginKey::new("a", "m")));
    }
}
