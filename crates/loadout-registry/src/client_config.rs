//! MCP server map in the client config
//!
//! `~/.claude.json` holds the `mcpServers` object alongside unrelated
//! client state. Only `mcpServers` is ever edited; everything else in the
//! document is preserved verbatim across rewrites.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{RegistryError, RegistryResult};
use crate::fsio;
use crate::paths::Paths;

/// A configured MCP server (stdio transport)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables passed to the server process
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl McpServerConfig {
    /// Create a config from a command and arguments
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    /// Human-readable command line
    #[must_use]
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// The client config document
#[derive(Debug, Clone)]
pub struct ClientConfig {
    raw: Value,
}

impl ClientConfig {
    /// Load the client config, an empty document if the file is missing
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(paths: &Paths) -> RegistryResult<Self> {
        let raw = fsio::read_json(&paths.client_config_file())?.unwrap_or_else(|| json!({}));
        if !raw.is_object() {
            return Err(RegistryError::Malformed {
                path: paths.client_config_file(),
                message: "Expected JSON object".into(),
            });
        }
        Ok(Self { raw })
    }

    /// Rewrite the whole file, backing up the previous copy
    ///
    /// # Errors
    /// Returns an error if the backup or the write fails.
    pub fn save(&self, paths: &Paths) -> RegistryResult<Option<String>> {
        let file = paths.client_config_file();
        let backup_id = fsio::backup_before_write(&paths.backups_dir(), &file)?;
        fsio::write_json(&file, &self.raw)?;
        Ok(backup_id)
    }

    /// Parse the configured MCP servers, skipping entries that do not
    /// match the expected shape
    #[must_use]
    pub fn servers(&self) -> BTreeMap<String, McpServerConfig> {
        let mut servers = BTreeMap::new();
        let Some(map) = self.raw.get("mcpServers").and_then(Value::as_object) else {
            return servers;
        };
        for (name, value) in map {
            if let Ok(config) = serde_json::from_value::<McpServerConfig>(value.clone()) {
                servers.insert(name.clone(), config);
            }
        }
        servers
    }

    /// Configured server names
    #[must_use]
    pub fn server_names(&self) -> Vec<String> {
        self.servers().keys().cloned().collect()
    }

    /// Insert or replace a server definition
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized.
    pub fn insert_server(&mut self, name: &str, config: &McpServerConfig) -> RegistryResult<()> {
        let value = serde_json::to_value(config).map_err(|e| RegistryError::Malformed {
            path: std::path::PathBuf::new(),
            message: e.to_string(),
        })?;
        self.servers_object_mut().insert(name.to_string(), value);
        Ok(())
    }

    /// Remove a server definition, reporting whether it was present
    pub fn remove_server(&mut self, name: &str) -> bool {
        self.servers_object_mut().remove(name).is_some()
    }

    fn servers_object_mut(&mut self) -> &mut Map<String, Value> {
        let root = self.raw.as_object_mut().expect("checked at load");
        root.entry("mcpServers").or_insert_with(|| json!({}));
        root.get_mut("mcpServers")
            .and_then(Value::as_object_mut)
            .expect("mcpServers inserted above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> Paths {
        Paths::resolve(Some(dir.path().to_path_buf())).unwrap()
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig::load(&paths(&dir)).unwrap();
        assert!(config.servers().is_empty());
    }

    #[test]
    fn test_servers_skip_malformed_entries() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        std::fs::write(
            paths.client_config_file(),
            r#"{
                "mcpServers": {
                    "github": {"command": "npx", "args": ["-y", "@modelcontextprotocol/server-github"]},
                    "broken": {"args": ["missing-command"]}
                }
            }"#,
        )
        .unwrap();

        let config = ClientConfig::load(&paths).unwrap();
        let servers = config.servers();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers["github"].command, "npx");
    }

    #[test]
    fn test_rewrite_preserves_unrelated_keys() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        std::fs::write(
            paths.client_config_file(),
            r#"{"theme": "dark", "numStartups": 42, "mcpServers": {"old": {"command": "node"}}}"#,
        )
        .unwrap();

        let mut config = ClientConfig::load(&paths).unwrap();
        assert!(config.remove_server("old"));
        config
            .insert_server("github", &McpServerConfig::new("npx", vec!["-y".into()]))
            .unwrap();
        config.save(&paths).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(paths.client_config_file()).unwrap())
                .unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["numStartups"], 42);
        assert!(raw["mcpServers"].get("old").is_none());
        assert_eq!(raw["mcpServers"]["github"]["command"], "npx");
    }

    #[test]
    fn test_remove_absent_server() {
        let dir = TempDir::new().unwrap();
        let mut config = ClientConfig::load(&paths(&dir)).unwrap();
        assert!(!config.remove_server("nonexistent"));
    }
}
