//! Observed state and active-profile tracking

use std::collections::BTreeSet;
use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loadout_registry::{ClientConfig, MarketplaceRegistry, Paths, PluginKey, PluginRegistry};

use crate::error::{CoreError, CoreResult};

/// What is currently installed and configured, as sets keyed the way the
/// diff compares them
#[derive(Debug, Clone, Default)]
pub struct CurrentState {
    /// Installed plugin keys
    pub plugins: BTreeSet<PluginKey>,
    /// Configured MCP server names
    pub mcp_servers: BTreeSet<String>,
    /// Known marketplace names
    pub marketplaces: BTreeSet<String>,
}

impl CurrentState {
    /// Observe the three registries; absent files yield empty sets
    ///
    /// # Errors
    /// Returns an error if a registry file exists but cannot be parsed.
    pub fn observe(paths: &Paths) -> CoreResult<Self> {
        let plugins = PluginRegistry::load(paths)?.keys().cloned().collect();
        let mcp_servers = ClientConfig::load(paths)?.server_names().into_iter().collect();
        let marketplaces = MarketplaceRegistry::load(paths)?.names().cloned().collect();

        Ok(Self { plugins, mcp_servers, marketplaces })
    }
}

/// Which profile was last applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveState {
    /// Active profile name
    pub profile: Option<String>,
    /// When the profile was last applied
    pub applied_at: Option<DateTime<Utc>>,
    /// Last time this state was written
    pub updated_at: Option<DateTime<Utc>>,
}

impl ActiveState {
    /// Load the state file, default when missing
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let path = paths.state_file();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|e| CoreError::io(&path, &e))?;
        serde_json::from_str(&content).map_err(|e| CoreError::json(&path, &e))
    }

    /// Record a profile as applied now and save
    ///
    /// # Errors
    /// Returns an error if the state file cannot be written.
    pub fn record_applied(paths: &Paths, profile: &str) -> CoreResult<()> {
        let now = Utc::now();
        let state = Self {
            profile: Some(profile.to_string()),
            applied_at: Some(now),
            updated_at: Some(now),
        };
        state.save(paths)
    }

    /// Save the state file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        let path = paths.state_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, &e))?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| CoreError::json(&path, &e))?;
        fs::write(&path, content).map_err(|e| CoreError::io(&path, &e))
    }
}
