//! Profile types
//!
//! A profile is the declarative target state: the plugins, MCP servers,
//! and marketplaces a machine should have, plus detect rules for
//! auto-suggestion and the sandbox configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loadout_registry::{MarketplaceSource, PluginKey};

/// A declarative configuration bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name (also the file stem)
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plugins this profile wants installed
    #[serde(default)]
    pub plugins: Vec<PluginKey>,
    /// MCP servers this profile wants configured
    #[serde(default)]
    pub mcp_servers: Vec<McpServerDef>,
    /// Marketplaces the plugins come from
    #[serde(default)]
    pub marketplaces: Vec<MarketplaceRef>,
    /// Rules for suggesting this profile for a project directory
    #[serde(default)]
    pub detect: Vec<DetectRule>,
    /// Sandbox configuration
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new empty profile with the given name
    #[must_use]
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            name,
            description: None,
            plugins: Vec::new(),
            mcp_servers: Vec::new(),
            marketplaces: Vec::new(),
            detect: Vec::new(),
            sandbox: SandboxConfig::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Names of the MCP servers this profile wants
    pub fn mcp_server_names(&self) -> impl Iterator<Item = &str> {
        self.mcp_servers.iter().map(|s| s.name.as_str())
    }

    /// Look up one MCP server definition by name
    #[must_use]
    pub fn mcp_server(&self, name: &str) -> Option<&McpServerDef> {
        self.mcp_servers.iter().find(|s| s.name == name)
    }
}

/// An MCP server definition in a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerDef {
    /// Server name (unique within the profile)
    pub name: String,
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Static environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Environment variables filled from the secret chain at install time,
    /// env var name to secret name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, String>,
}

/// A marketplace the profile depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceRef {
    /// Marketplace name
    pub name: String,
    /// Source descriptor
    pub source: MarketplaceSource,
}

/// Predicate for auto-suggesting a profile for a project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectRule {
    /// A path exists under the project directory
    FileExists { path: PathBuf },
    /// A file under the project directory contains a substring
    FileContains { path: PathBuf, substring: String },
}

impl DetectRule {
    /// Evaluate the rule against a project directory
    #[must_use]
    pub fn matches(&self, dir: &Path) -> bool {
        match self {
            Self::FileExists { path } => dir.join(path).exists(),
            Self::FileContains { path, substring } => std::fs::read_to_string(dir.join(path))
                .is_ok_and(|content| content.contains(substring)),
        }
    }
}

/// Sandbox configuration carried by a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Bind mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    /// Static environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Environment variables filled from the secret chain,
    /// env var name to secret name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, String>,
}

/// A bind mount in the sandbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Host path
    pub source: PathBuf,
    /// Path inside the sandbox
    pub target: PathBuf,
    /// Mount read-only
    #[serde(default)]
    pub read_only: bool,
}
