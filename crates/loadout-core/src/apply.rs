//! Apply engine
//!
//! Executes a diff through the external `claude` CLI. Ordering contract:
//! removals run before any addition, and marketplace additions run before
//! plugin installs (a plugin's marketplace must be registered first).
//! A failing item is recorded and the batch continues; the apply never
//! aborts on one item.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::ProfileDiff;
use crate::error::CoreResult;
use crate::exec::{ClaudeCli, CommandOutput};
use crate::profile::{McpServerDef, Profile};
use crate::secrets::SecretChain;

/// Output markers the CLI emits for an item that is already installed
const ALREADY_PRESENT_MARKERS: &[&str] =
    &["already installed", "already exists", "already registered"];

/// Output markers for an item that is already gone
const ALREADY_REMOVED_MARKERS: &[&str] =
    &["not installed", "already uninstalled", "not found", "no mcp server"];

/// Which collection an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Plugins,
    McpServers,
    Marketplaces,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plugins => write!(f, "plugin"),
            Self::McpServers => write!(f, "mcp server"),
            Self::Marketplaces => write!(f, "marketplace"),
        }
    }
}

/// Whether an operation adds or removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Install,
    Remove,
}

/// Per-item outcome after classification
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Applied,
    AlreadyDone,
    Failed(String),
}

/// Classify a command's result, absorbing benign already-applied states
fn classify(output: &CommandOutput, direction: Direction) -> Outcome {
    if output.success {
        return Outcome::Applied;
    }

    let text = output.text().to_lowercase();
    let markers = match direction {
        Direction::Install => ALREADY_PRESENT_MARKERS,
        Direction::Remove => ALREADY_REMOVED_MARKERS,
    };
    if markers.iter().any(|marker| text.contains(marker)) {
        return Outcome::AlreadyDone;
    }

    Outcome::Failed(output.error_text())
}

/// Counts for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Items newly installed or added
    pub installed: usize,
    /// Items newly removed
    pub removed: usize,
    /// Items the CLI reported as already present
    pub already_present: usize,
    /// Items the CLI reported as already gone
    pub already_removed: usize,
}

/// A real (non-benign) failure for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyError {
    /// Which collection the item belongs to
    pub category: Category,
    /// The item that failed
    pub item: String,
    /// What the CLI (or secret chain) reported
    pub message: String,
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.category, self.item, self.message)
    }
}

/// Aggregate result of one apply run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Plugin tallies
    pub plugins: Tally,
    /// MCP server tallies
    pub mcp_servers: Tally,
    /// Marketplace tallies (never has removals)
    pub marketplaces: Tally,
    /// Real failures, in the order they occurred
    pub errors: Vec<ApplyError>,
}

impl ApplyResult {
    /// Whether the run completed without real failures
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, category: Category, item: &str, direction: Direction, outcome: Outcome) {
        let tally = match category {
            Category::Plugins => &mut self.plugins,
            Category::McpServers => &mut self.mcp_servers,
            Category::Marketplaces => &mut self.marketplaces,
        };
        match (direction, outcome) {
            (Direction::Install, Outcome::Applied) => tally.installed += 1,
            (Direction::Install, Outcome::AlreadyDone) => tally.already_present += 1,
            (Direction::Remove, Outcome::Applied) => tally.removed += 1,
            (Direction::Remove, Outcome::AlreadyDone) => tally.already_removed += 1,
            (_, Outcome::Failed(message)) => {
                self.errors.push(ApplyError { category, item: item.to_string(), message });
            }
        }
    }

    fn record_secret_failure(&mut self, item: &str, message: String) {
        self.errors.push(ApplyError {
            category: Category::McpServers,
            item: item.to_string(),
            message,
        });
    }
}

/// Execute a diff against the external CLI
///
/// Phases, in order: plugin removals, MCP removals, marketplace
/// additions, plugin installs, MCP installs. Secrets for an MCP server
/// are resolved before its add command is built; a resolution failure
/// aborts only that server.
///
/// # Errors
/// Returns an error only when the external CLI cannot be spawned at all;
/// per-item failures are collected in the result.
pub fn apply(
    profile: &Profile,
    diff: &ProfileDiff,
    cli: &ClaudeCli<'_>,
    secrets: &SecretChain,
) -> CoreResult<ApplyResult> {
    let mut result = ApplyResult::default();

    for key in &diff.plugins_to_remove {
        let output = cli.plugin_uninstall(key)?;
        let outcome = classify(&output, Direction::Remove);
        debug!(plugin = %key, ?outcome, "plugin removal");
        result.record(Category::Plugins, &key.to_string(), Direction::Remove, outcome);
    }

    for name in &diff.mcp_to_remove {
        let output = cli.mcp_remove(name)?;
        let outcome = classify(&output, Direction::Remove);
        debug!(server = %name, ?outcome, "mcp removal");
        result.record(Category::McpServers, name, Direction::Remove, outcome);
    }

    for marketplace in &diff.marketplaces_to_add {
        let output = cli.marketplace_add(marketplace.source.location())?;
        let outcome = classify(&output, Direction::Install);
        debug!(marketplace = %marketplace.name, ?outcome, "marketplace add");
        result.record(Category::Marketplaces, &marketplace.name, Direction::Install, outcome);
    }

    for key in &diff.plugins_to_install {
        let output = cli.plugin_install(key)?;
        let outcome = classify(&output, Direction::Install);
        debug!(plugin = %key, ?outcome, "plugin install");
        result.record(Category::Plugins, &key.to_string(), Direction::Install, outcome);
    }

    for name in &diff.mcp_to_install {
        let Some(server) = profile.mcp_server(name) else {
            continue;
        };
        install_mcp_server(server, cli, secrets, &mut result)?;
    }

    Ok(result)
}

/// Resolve a server's secrets, then issue its add command
fn install_mcp_server(
    server: &McpServerDef,
    cli: &ClaudeCli<'_>,
    secrets: &SecretChain,
    result: &mut ApplyResult,
) -> CoreResult<()> {
    let mut env: Vec<(String, String)> =
        server.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    for (var, secret_name) in &server.secrets {
        match secrets.resolve(secret_name) {
            Ok(value) => env.push((var.clone(), value)),
            Err(e) => {
                result.record_secret_failure(&server.name, e.to_string());
                return Ok(());
            }
        }
    }

    let output = cli.mcp_add(&server.name, &server.command, &server.args, &env)?;
    let outcome = classify(&output, Direction::Install);
    debug!(server = %server.name, ?outcome, "mcp install");
    result.record(Category::McpServers, &server.name, Direction::Install, outcome);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(success: bool, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput { success, stdout: stdout.into(), stderr: stderr.into() }
    }

    #[test]
    fn test_classify_success() {
        let out = output(true, "Installed fmt-tools", "");
        assert_eq!(classify(&out, Direction::Install), Outcome::Applied);
    }

    #[test]
    fn test_classify_already_installed_is_benign() {
        let out = output(false, "", "Error: plugin fmt-tools is already installed");
        assert_eq!(classify(&out, Direction::Install), Outcome::AlreadyDone);
    }

    #[test]
    fn test_classify_already_removed_is_benign() {
        let out = output(false, "", "No MCP server found with name: github");
        assert_eq!(classify(&out, Direction::Remove), Outcome::AlreadyDone);

        let out = output(false, "Plugin linter is not installed", "");
        assert_eq!(classify(&out, Direction::Remove), Outcome::AlreadyDone);
    }

    #[test]
    fn test_classify_direction_matters() {
        // "not found" is benign on removal, a real failure on install
        let out = output(false, "", "marketplace not found");
        assert_eq!(classify(&out, Direction::Remove), Outcome::AlreadyDone);
        assert!(matches!(classify(&out, Direction::Install), Outcome::Failed(_)));
    }

    #[test]
    fn test_classify_real_failure() {
        let out = output(false, "", "network timeout talking to registry");
        let Outcome::Failed(message) = classify(&out, Direction::Install) else {
            panic!("expected failure");
        };
        assert_eq!(message, "network timeout talking to registry");
    }
}
