//! Profile creation from observed state

use loadout_registry::{ClientConfig, MarketplaceRegistry, Paths, PluginRegistry};

use super::types::{MarketplaceRef, McpServerDef, Profile};
use crate::error::CoreResult;

/// Build a profile from what is currently installed and configured
///
/// Plugins come from the plugin registry, MCP servers from the client
/// config (their env copied as static env, secrets left empty for the
/// user to fill in), marketplaces from the marketplace registry.
///
/// # Errors
/// Returns an error if any registry cannot be read.
pub fn snapshot(paths: &Paths, name: String) -> CoreResult<Profile> {
    let mut profile = Profile::new(name);

    let plugins = PluginRegistry::load(paths)?;
    profile.plugins = plugins.keys().cloned().collect();

    let client = ClientConfig::load(paths)?;
    profile.mcp_servers = client
        .servers()
        .into_iter()
        .map(|(name, config)| McpServerDef {
            name,
            command: config.command,
            args: config.args,
            env: config.env,
            secrets: std::collections::BTreeMap::new(),
        })
        .collect();

    let marketplaces = MarketplaceRegistry::load(paths)?;
    profile.marketplaces = marketplaces
        .iter()
        .map(|(name, entry)| MarketplaceRef {
            name: name.clone(),
            source: entry.source.clone(),
        })
        .collect();

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_empty_state() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::resolve(Some(dir.path().to_path_buf())).unwrap();

        let profile = snapshot(&paths, "empty".into()).unwrap();
        assert_eq!(profile.name, "empty");
        assert!(profile.plugins.is_empty());
        assert!(profile.mcp_servers.is_empty());
        assert!(profile.marketplaces.is_empty());
    }

    #[test]
    fn test_snapshot_captures_state() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::resolve(Some(dir.path().to_path_buf())).unwrap();

        let plugins_file = paths.installed_plugins_file();
        std::fs::create_dir_all(plugins_file.parent().unwrap()).unwrap();
        std::fs::write(
            &plugins_file,
            r#"{"version": 2, "plugins": {"fmt-tools@acme": {"version": "1.0.0", "installPath": "/tmp/p"}}}"#,
        )
        .unwrap();
        std::fs::write(
            paths.known_marketplaces_file(),
            r#"{"acme": {"source": {"source": "github", "repo": "acme/plugins"}}}"#,
        )
        .unwrap();
        std::fs::write(
            paths.client_config_file(),
            r#"{"mcpServers": {"github": {"command": "npx", "args": ["-y"], "env": {"DEBUG": "1"}}}}"#,
        )
        .unwrap();

        let profile = snapshot(&paths, "snap".into()).unwrap();
        assert_eq!(profile.plugins.len(), 1);
        assert_eq!(profile.plugins[0].to_string(), "fmt-tools@acme");
        assert_eq!(profile.marketplaces.len(), 1);
        assert_eq!(profile.marketplaces[0].name, "acme");

        assert_eq!(profile.mcp_servers.len(), 1);
        let server = &profile.mcp_servers[0];
        assert_eq!(server.name, "github");
        assert_eq!(server.env.get("DEBUG").map(String::as_str), Some("1"));
        assert!(server.secrets.is_empty());
    }
}
