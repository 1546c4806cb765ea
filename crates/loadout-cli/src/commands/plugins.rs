//! Plugin listing and enable/disable commands

use loadout_registry::{settings, Paths, PluginKey, PluginRegistry};

/// List installed plugins with version and enabled state
pub fn list(paths: &Paths, json: bool) -> anyhow::Result<()> {
    let registry = PluginRegistry::load(paths)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&registry)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No plugins installed.");
        return Ok(());
    }

    let enabled = settings::enabled_plugins(paths)?;

    println!("Installed plugins:");
    for (key, entry) in &registry.plugins {
        let state = if enabled.get(&key.to_string()).copied().unwrap_or(true) {
            "enabled"
        } else {
            "disabled"
        };
        let local = if entry.is_local { ", local" } else { "" };
        println!("  {} v{} ({state}{local})", key, entry.version);
    }
    Ok(())
}

/// Flip a plugin's enabled state in settings.json
pub fn set_enabled(paths: &Paths, plugin: &str, enabled: bool) -> anyhow::Result<()> {
    let key: PluginKey = plugin.parse()?;

    let registry = PluginRegistry::load(paths)?;
    if !registry.contains(&key) {
        anyhow::bail!("plugin '{key}' is not installed");
    }

    settings::set_plugin_enabled(paths, &key, enabled)?;
    println!("{} {}", if enabled { "Enabled" } else { "Disabled" }, key);
    Ok(())
}
