//! Known-marketplace registry
//!
//! `~/.claude/plugins/known_marketplaces.json` maps marketplace names to
//! their source descriptors. The registry is additive: Claude Code has no
//! marketplace-remove operation and neither does this tool.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryResult;
use crate::fsio;
use crate::paths::Paths;

/// Where a marketplace's contents come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum MarketplaceSource {
    /// GitHub repository, `owner/repo`
    Github { repo: String },
    /// Arbitrary git URL
    Git { url: String },
}

impl MarketplaceSource {
    /// The location string handed to `claude plugin marketplace add`
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Github { repo } => repo,
            Self::Git { url } => url,
        }
    }
}

/// One registered marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceEntry {
    /// Source descriptor
    pub source: MarketplaceSource,
    /// Where the marketplace checkout lives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_location: Option<String>,
}

/// The known-marketplace registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketplaceRegistry {
    entries: BTreeMap<String, MarketplaceEntry>,
}

impl MarketplaceRegistry {
    /// Load the registry, empty if the file does not exist
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(paths: &Paths) -> RegistryResult<Self> {
        Ok(fsio::read_json(&paths.known_marketplaces_file())?.unwrap_or_default())
    }

    /// Rewrite the whole registry file, backing up the previous copy
    ///
    /// # Errors
    /// Returns an error if the backup or the write fails.
    pub fn save(&self, paths: &Paths) -> RegistryResult<Option<String>> {
        let file = paths.known_marketplaces_file();
        let backup_id = fsio::backup_before_write(&paths.backups_dir(), &file)?;
        fsio::write_json(&file, self)?;
        Ok(backup_id)
    }

    /// Registered marketplace names
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Whether a marketplace is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up one entry
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MarketplaceEntry> {
        self.entries.get(name)
    }

    /// Register a marketplace; there is no removal counterpart by design
    pub fn add(&mut self, name: impl Into<String>, entry: MarketplaceEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Iterate entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MarketplaceEntry)> {
        self.entries.iter()
    }

    /// Number of registered marketplaces
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
