//! Desired-vs-actual diff
//!
//! Plugins and MCP servers reconcile by set subtraction for removals, but
//! the install side is the whole profile list: the backing CLI's own
//! bookkeeping can desync from the JSON registries, so profile items are
//! always re-registered even when they look present. Marketplaces are
//! monotonic; nothing ever computes a marketplace removal.

use loadout_registry::PluginKey;

use crate::profile::{MarketplaceRef, Profile};
use crate::state::CurrentState;

/// Computed reconciliation sets for one apply
///
/// Computed fresh on every apply; never persisted.
#[derive(Debug, Clone, Default)]
pub struct ProfileDiff {
    /// Plugins to install (every profile plugin, not just the delta)
    pub plugins_to_install: Vec<PluginKey>,
    /// Plugins present but not wanted
    pub plugins_to_remove: Vec<PluginKey>,
    /// MCP servers to install (every profile server)
    pub mcp_to_install: Vec<String>,
    /// MCP servers present but not wanted
    pub mcp_to_remove: Vec<String>,
    /// Marketplaces wanted but not yet known
    pub marketplaces_to_add: Vec<MarketplaceRef>,
}

impl ProfileDiff {
    /// Compute the diff between a profile and the observed state
    #[must_use]
    pub fn compute(profile: &Profile, state: &CurrentState) -> Self {
        let plugins_to_remove = state
            .plugins
            .iter()
            .filter(|key| !profile.plugins.contains(key))
            .cloned()
            .collect();

        let mcp_to_remove = state
            .mcp_servers
            .iter()
            .filter(|name| profile.mcp_server(name).is_none())
            .cloned()
            .collect();

        let marketplaces_to_add = profile
            .marketplaces
            .iter()
            .filter(|m| !state.marketplaces.contains(&m.name))
            .cloned()
            .collect();

        Self {
            plugins_to_install: profile.plugins.clone(),
            plugins_to_remove,
            mcp_to_install: profile.mcp_server_names().map(String::from).collect(),
            mcp_to_remove,
            marketplaces_to_add,
        }
    }

    /// Whether the diff contains no work at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins_to_install.is_empty()
            && self.plugins_to_remove.is_empty()
            && self.mcp_to_install.is_empty()
            && self.mcp_to_remove.is_empty()
            && self.marketplaces_to_add.is_empty()
    }

    /// Total number of operations the apply will issue
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins_to_install.len()
            + self.plugins_to_remove.len()
            + self.mcp_to_install.len()
            + self.mcp_to_remove.len()
            + self.marketplaces_to_add.len()
    }
}
