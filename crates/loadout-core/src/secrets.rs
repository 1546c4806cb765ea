//! Secret resolution chain
//!
//! Secrets referenced by MCP server and sandbox definitions are resolved
//! through a chain of backends: environment variable, then the 1Password
//! CLI, then the OS keychain. The first available backend that returns a
//! value wins; a backend error falls through to the next.

use std::process::Command;

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Keychain service name under which loadout secrets are stored
const KEYCHAIN_SERVICE: &str = "loadout";

/// One secret backend
pub trait SecretResolver {
    /// Backend name, used in error messages and doctor output
    fn name(&self) -> &'static str;

    /// Whether the backend can be consulted at all on this machine
    fn available(&self) -> bool;

    /// Look up a secret; `Ok(None)` means not found here
    ///
    /// # Errors
    /// Returns an error if the backend was consulted but failed.
    fn resolve(&self, key: &str) -> CoreResult<Option<String>>;
}

/// Environment variable backend
///
/// Tries the secret name verbatim, then upper-cased with `-` mapped to `_`
/// (so `github-token` finds `GITHUB_TOKEN`).
#[derive(Debug, Default)]
pub struct EnvResolver;

impl SecretResolver for EnvResolver {
    fn name(&self) -> &'static str {
        "env"
    }

    fn available(&self) -> bool {
        true
    }

    fn resolve(&self, key: &str) -> CoreResult<Option<String>> {
        if let Ok(value) = std::env::var(key) {
            return Ok(Some(value));
        }
        let upper = key.to_uppercase().replace('-', "_");
        if upper != key {
            if let Ok(value) = std::env::var(&upper) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

/// 1Password CLI backend
///
/// Secret names that are full `op://` references are read directly;
/// anything else is treated as an item name in the default vault.
#[derive(Debug, Default)]
pub struct OnePasswordResolver;

impl SecretResolver for OnePasswordResolver {
    fn name(&self) -> &'static str {
        "1password"
    }

    fn available(&self) -> bool {
        Command::new("op")
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }

    fn resolve(&self, key: &str) -> CoreResult<Option<String>> {
        let output = if key.starts_with("op://") {
            Command::new("op").args(["read", key]).output()
        } else {
            Command::new("op")
                .args(["item", "get", key, "--fields", "credential", "--reveal"])
                .output()
        }
        .map_err(|e| CoreError::Spawn { program: "op".into(), message: e.to_string() })?;

        if !output.status.success() {
            return Ok(None);
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if value.is_empty() { None } else { Some(value) })
    }
}

/// OS keychain backend (keyring crate, service `loadout`)
#[derive(Debug, Default)]
pub struct KeychainResolver;

impl SecretResolver for KeychainResolver {
    fn name(&self) -> &'static str {
        "keychain"
    }

    fn available(&self) -> bool {
        true
    }

    fn resolve(&self, key: &str) -> CoreResult<Option<String>> {
        let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, key) else {
            return Ok(None);
        };
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(_) => Ok(None),
        }
    }
}

/// An ordered chain of secret backends
pub struct SecretChain {
    resolvers: Vec<Box<dyn SecretResolver>>,
}

impl SecretChain {
    /// The standard chain: env, 1Password, keychain
    #[must_use]
    pub fn standard() -> Self {
        Self {
            resolvers: vec![
                Box::new(EnvResolver),
                Box::new(OnePasswordResolver),
                Box::new(KeychainResolver),
            ],
        }
    }

    /// Build a chain from explicit backends (used by tests)
    #[must_use]
    pub fn with_resolvers(resolvers: Vec<Box<dyn SecretResolver>>) -> Self {
        Self { resolvers }
    }

    /// The configured backends, in consultation order
    pub fn resolvers(&self) -> impl Iterator<Item = &dyn SecretResolver> {
        self.resolvers.iter().map(AsRef::as_ref)
    }

    /// Resolve one secret through the chain
    ///
    /// # Errors
    /// Returns `SecretUnresolved` when every backend is unavailable,
    /// errors, or has no value.
    pub fn resolve(&self, name: &str) -> CoreResult<String> {
        let mut tried = Vec::new();
        for resolver in &self.resolvers {
            if !resolver.available() {
                continue;
            }
            tried.push(resolver.name());
            match resolver.resolve(name) {
                Ok(Some(value)) => {
                    debug!(secret = name, backend = resolver.name(), "secret resolved");
                    return Ok(value);
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(secret = name, backend = resolver.name(), error = %e, "resolver failed");
                }
            }
        }

        Err(CoreError::SecretUnresolved {
            name: name.to_string(),
            tried: if tried.is_empty() { "none available".to_string() } else { tried.join(", ") },
        })
    }
}
