//! Registry hygiene
//!
//! Finds installed-plugin entries whose install path no longer exists on
//! disk and prunes them from the registry.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RegistryResult;
use crate::key::PluginKey;
use crate::paths::Paths;
use crate::plugins::PluginRegistry;

/// A registry entry pointing at a missing install directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanedEntry {
    /// Plugin key
    pub key: PluginKey,
    /// The path the registry claims, which no longer exists
    pub install_path: PathBuf,
}

/// Report of registry entries that can be pruned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Orphaned entries
    pub orphaned: Vec<OrphanedEntry>,
    /// Total entries checked
    pub checked: usize,
}

impl CleanupReport {
    /// Scan the plugin registry for orphaned entries
    ///
    /// # Errors
    /// Returns an error if the registry cannot be read.
    pub fn scan(paths: &Paths) -> RegistryResult<Self> {
        let registry = PluginRegistry::load(paths)?;
        let checked = registry.len();

        let orphaned = registry
            .plugins
            .iter()
            .filter(|(_, entry)| !entry.install_path.exists())
            .map(|(key, entry)| OrphanedEntry {
                key: key.clone(),
                install_path: entry.install_path.clone(),
            })
            .collect();

        Ok(Self { orphaned, checked })
    }

    /// Whether there is nothing to prune
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty()
    }

    /// Rewrite the registry without the orphaned entries
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    /// Returns an error if the registry cannot be read or rewritten.
    pub fn prune(&self, paths: &Paths) -> RegistryResult<usize> {
        if self.is_clean() {
            return Ok(0);
        }

        let mut registry = PluginRegistry::load(paths)?;
        let mut removed = 0;
        for entry in &self.orphaned {
            if registry.remove(&entry.key).is_some() {
                removed += 1;
            }
        }
        registry.save(paths)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> Paths {
        Paths::resolve(Some(dir.path().to_path_buf())).unwrap()
    }

    fn seed_registry(paths: &Paths, live_dir: &std::path::Path) {
        let file = paths.installed_plugins_file();
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(
            file,
            format!(
                r#"{{"version": 2, "plugins": {{
                    "live@m": {{"version": "1.0.0", "installPath": "{}"}},
                    "gone@m": {{"version": "1.0.0", "installPath": "{}"}}
                }}}}"#,
                live_dir.display(),
                live_dir.join("does-not-exist").display()
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_scan_finds_missing_paths_only() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        seed_registry(&paths, dir.path());

        let report = CleanupReport::scan(&paths).unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.orphaned.len(), 1);
        assert_eq!(report.orphaned[0].key, PluginKey::new("gone", "m"));
    }

    #[test]
    fn test_prune_rewrites_registry() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        seed_registry(&paths, dir.path());

        let report = CleanupReport::scan(&paths).unwrap();
        assert_eq!(report.prune(&paths).unwrap(), 1);

        let registry = PluginRegistry::load(&paths).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&PluginKey::new("live", "m")));
    }

    #[test]
    fn test_prune_clean_report_is_noop() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        let report = CleanupReport::default();
        assert_eq!(report.prune(&paths).unwrap(), 0);
        assert!(!paths.installed_plugins_file().exists());
    }
}
