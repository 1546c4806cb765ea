//! Loadout Registry - Claude Code on-disk state I/O
//!
//! This crate reads and rewrites the JSON registries Claude Code keeps on
//! disk: the installed-plugin registry, the known-marketplace registry,
//! the MCP-server-bearing client config, and the enabled-plugin settings.
//! It holds no policy; diffing and reconciliation live in `loadout-core`.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cleanup;
pub mod client_config;
pub mod error;
mod fsio;
pub mod key;
pub mod marketplaces;
pub mod paths;
pub mod plugins;
pub mod settings;

pub use client_config::{ClientConfig, McpServerConfig};
pub use error::{RegistryError, RegistryResult};
pub use key::PluginKey;
pub use marketplaces::{MarketplaceEntry, MarketplaceRegistry, MarketplaceSource};
pub use paths::Paths;
pub use plugins::{PluginEntry, PluginRegistry};
