//! Health checks
//!
//! Each check is a load-and-inspect pass over one piece of managed state;
//! the CLI prints the report and exits non-zero if any check failed.

use loadout_registry::cleanup::CleanupReport;
use loadout_registry::{ClientConfig, MarketplaceRegistry, Paths, PluginRegistry};

use crate::exec::ClaudeCli;
use crate::profile::ProfileStore;
use crate::secrets::{SecretChain, SecretResolver};
use crate::state::ActiveState;

/// Result of one health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// One health check's outcome
#[derive(Debug, Clone)]
pub struct DoctorCheck {
    /// Check name
    pub name: String,
    /// Outcome
    pub status: CheckStatus,
    /// Human-readable detail
    pub detail: String,
}

impl DoctorCheck {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self { name: name.to_string(), status, detail: detail.into() }
    }
}

/// Run every health check
#[must_use]
pub fn run(paths: &Paths, cli: &ClaudeCli<'_>, secrets: &SecretChain) -> Vec<DoctorCheck> {
    let mut checks = Vec::new();

    checks.push(match cli.version() {
        Ok(output) if output.success => {
            DoctorCheck::new("claude-cli", CheckStatus::Ok, output.stdout.trim().to_string())
        }
        Ok(output) => DoctorCheck::new("claude-cli", CheckStatus::Fail, output.error_text()),
        Err(e) => DoctorCheck::new("claude-cli", CheckStatus::Fail, e.to_string()),
    });

    checks.push(match PluginRegistry::load(paths) {
        Ok(registry) => DoctorCheck::new(
            "plugin-registry",
            CheckStatus::Ok,
            format!("{} plugins installed", registry.len()),
        ),
        Err(e) => DoctorCheck::new("plugin-registry", CheckStatus::Fail, e.to_string()),
    });

    checks.push(match MarketplaceRegistry::load(paths) {
        Ok(registry) => DoctorCheck::new(
            "marketplace-registry",
            CheckStatus::Ok,
            format!("{} marketplaces known", registry.len()),
        ),
        Err(e) => DoctorCheck::new("marketplace-registry", CheckStatus::Fail, e.to_string()),
    });

    checks.push(match ClientConfig::load(paths) {
        Ok(config) => DoctorCheck::new(
            "client-config",
            CheckStatus::Ok,
            format!("{} MCP servers configured", config.servers().len()),
        ),
        Err(e) => DoctorCheck::new("client-config", CheckStatus::Fail, e.to_string()),
    });

    checks.push(match ProfileStore::new(paths).list() {
        Ok(profiles) => DoctorCheck::new(
            "profiles",
            CheckStatus::Ok,
            format!("{} profiles defined", profiles.len()),
        ),
        Err(e) => DoctorCheck::new("profiles", CheckStatus::Fail, e.to_string()),
    });

    checks.push(match CleanupReport::scan(paths) {
        Ok(report) if report.is_clean() => {
            DoctorCheck::new("registry-hygiene", CheckStatus::Ok, "no orphaned entries")
        }
        Ok(report) => DoctorCheck::new(
            "registry-hygiene",
            CheckStatus::Warn,
            format!("{} orphaned entries (run cleanup)", report.orphaned.len()),
        ),
        Err(e) => DoctorCheck::new("registry-hygiene", CheckStatus::Fail, e.to_string()),
    });

    checks.push(active_profile_check(paths, secrets));

    checks
}

/// Check the active profile exists and its secrets have a viable backend
fn active_profile_check(paths: &Paths, secrets: &SecretChain) -> DoctorCheck {
    let active = match ActiveState::load(paths) {
        Ok(state) => state,
        Err(e) => return DoctorCheck::new("active-profile", CheckStatus::Fail, e.to_string()),
    };

    let Some(name) = active.profile else {
        return DoctorCheck::new("active-profile", CheckStatus::Warn, "no profile applied yet");
    };

    let store = ProfileStore::new(paths);
    let profile = match store.load(&name) {
        Ok(profile) => profile,
        Err(e) => return DoctorCheck::new("active-profile", CheckStatus::Fail, e.to_string()),
    };

    let secret_count: usize = profile.mcp_servers.iter().map(|s| s.secrets.len()).sum::<usize>()
        + profile.sandbox.secrets.len();
    if secret_count > 0 && !secrets.resolvers().any(|r| r.available()) {
        return DoctorCheck::new(
            "active-profile",
            CheckStatus::Fail,
            format!("'{name}' references {secret_count} secrets but no resolver is available"),
        );
    }

    DoctorCheck::new("active-profile", CheckStatus::Ok, format!("'{name}'"))
}

/// Whether any check failed (warns do not fail the doctor)
#[must_use]
pub fn has_failures(checks: &[DoctorCheck]) -> bool {
    checks.iter().any(|c| c.status == CheckStatus::Fail)
}
