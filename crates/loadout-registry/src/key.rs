//! Plugin identity
//!
//! The registries key plugins by `"<plugin>@<marketplace>"`. The composite
//! string only exists at the file boundary; in memory a plugin is always a
//! `PluginKey` with explicit fields.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Identity of an installed or desired plugin
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PluginKey {
    /// Plugin name
    pub name: String,
    /// Marketplace it comes from, if qualified
    pub marketplace: Option<String>,
}

impl PluginKey {
    /// Create a marketplace-qualified key
    #[must_use]
    pub fn new(name: impl Into<String>, marketplace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marketplace: Some(marketplace.into()),
        }
    }

    /// Create an unqualified key (bare plugin name)
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marketplace: None,
        }
    }
}

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.marketplace {
            Some(marketplace) => write!(f, "{}@{marketplace}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for PluginKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.starts_with('@') {
            return Err(RegistryError::InvalidKey(s.to_string()));
        }
        match s.split_once('@') {
            Some((name, marketplace)) => {
                if marketplace.is_empty() || marketplace.contains('@') {
                    return Err(RegistryError::InvalidKey(s.to_string()));
                }
                Ok(Self::new(name, marketplace))
            }
            None => Ok(Self::bare(s)),
        }
    }
}

// String form on the wire so keys can index JSON objects.

impl Serialize for PluginKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PluginKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = PluginKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a plugin key of the form name or name@marketplace")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(|_| E::custom(format!("invalid plugin key: {v}")))
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}
