//! Enabled-plugin settings
//!
//! `~/.claude/settings.json` carries an `enabledPlugins` map from plugin
//! key to bool. A plugin absent from the map is treated as enabled.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::{RegistryError, RegistryResult};
use crate::fsio;
use crate::key::PluginKey;
use crate::paths::Paths;

/// Read the `enabledPlugins` map, empty if the file or key is missing
///
/// # Errors
/// Returns an error if the settings file exists but cannot be parsed.
pub fn enabled_plugins(paths: &Paths) -> RegistryResult<BTreeMap<String, bool>> {
    let Some(settings) = fsio::read_json::<Value>(&paths.settings_file())? else {
        return Ok(BTreeMap::new());
    };

    let Some(map) = settings.get("enabledPlugins").and_then(Value::as_object) else {
        return Ok(BTreeMap::new());
    };

    Ok(map
        .iter()
        .filter_map(|(key, value)| value.as_bool().map(|enabled| (key.clone(), enabled)))
        .collect())
}

/// Whether a plugin is enabled (default true when unlisted)
///
/// # Errors
/// Returns an error if the settings file exists but cannot be parsed.
pub fn is_plugin_enabled(paths: &Paths, key: &PluginKey) -> RegistryResult<bool> {
    Ok(enabled_plugins(paths)?
        .get(&key.to_string())
        .copied()
        .unwrap_or(true))
}

/// Flip one plugin's enabled state, creating the file as needed
///
/// # Errors
/// Returns an error if the settings file cannot be read, parsed, or written.
pub fn set_plugin_enabled(paths: &Paths, key: &PluginKey, enabled: bool) -> RegistryResult<()> {
    let file = paths.settings_file();
    let mut settings: Value = fsio::read_json(&file)?.unwrap_or_else(|| json!({}));

    let root = settings.as_object_mut().ok_or_else(|| RegistryError::Malformed {
        path: file.clone(),
        message: "Expected JSON object".into(),
    })?;

    root.entry("enabledPlugins").or_insert_with(|| json!({}));
    root.get_mut("enabledPlugins")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| RegistryError::Malformed {
            path: file.clone(),
            message: "enabledPlugins is not an object".into(),
        })?
        .insert(key.to_string(), Value::Bool(enabled));

    fsio::write_json(&file, &settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> Paths {
        Paths::resolve(Some(dir.path().to_path_buf())).unwrap()
    }

    #[test]
    fn test_missing_file_defaults_enabled() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        assert!(enabled_plugins(&paths).unwrap().is_empty());
        assert!(is_plugin_enabled(&paths, &PluginKey::new("a", "m")).unwrap());
    }

    #[test]
    fn test_set_and_read_back() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        let key = PluginKey::new("fmt-tools", "acme");

        set_plugin_enabled(&paths, &key, false).unwrap();
        assert!(!is_plugin_enabled(&paths, &key).unwrap());

        set_plugin_enabled(&paths, &key, true).unwrap();
        assert!(is_plugin_enabled(&paths, &key).unwrap());
    }

    #[test]
    fn test_preserves_other_settings() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        std::fs::create_dir_all(paths.settings_file().parent().unwrap()).unwrap();
        std::fs::write(paths.settings_file(), r#"{"model": "opus"}"#).unwrap();

        set_plugin_enabled(&paths, &PluginKey::new("a", "m"), false).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(paths.settings_file()).unwrap()).unwrap();
        assert_eq!(raw["model"], "opus");
        assert_eq!(raw["enabledPlugins"]["a@m"], false);
    }
}
