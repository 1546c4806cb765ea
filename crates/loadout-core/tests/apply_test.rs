//! Apply engine tests
//!
//! Runs the engine against a scripted runner that records every
//! invocation, checking the ordering contract, benign-outcome absorption,
//! partial-failure tolerance, and secret gating.

use std::cell::RefCell;
use std::collections::BTreeMap;

use loadout_core::apply::{apply, Category};
use loadout_core::diff::ProfileDiff;
use loadout_core::error::{CoreError, CoreResult};
use loadout_core::exec::{ClaudeCli, CommandOutput, CommandRunner};
use loadout_core::profile::{MarketplaceRef, McpServerDef, Profile};
use loadout_core::secrets::{SecretChain, SecretResolver};
use loadout_core::state::CurrentState;
use loadout_registry::MarketplaceSource;

/// Records invocations; scripted failures keyed by an argument substring
struct ScriptedRunner {
    calls: RefCell<Vec<Vec<String>>>,
    failures: Vec<(&'static str, &'static str)>,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self { calls: RefCell::new(Vec::new()), failures: Vec::new() }
    }

    fn with_failure(mut self, arg_substring: &'static str, message: &'static str) -> Self {
        self.failures.push((arg_substring, message));
        self
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Index of the first call whose args contain the substring
    fn position_of(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .position(|call| call.iter().any(|arg| arg.contains(needle)))
            .unwrap_or_else(|| panic!("no call containing '{needle}'"))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, _program: &str, args: &[String]) -> CoreResult<CommandOutput> {
        self.calls.borrow_mut().push(args.to_vec());

        for (needle, message) in &self.failures {
            if args.iter().any(|arg| arg.contains(needle)) {
                return Ok(CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: (*message).to_string(),
                });
            }
        }

        Ok(CommandOutput { success: true, stdout: "done".into(), stderr: String::new() })
    }
}

struct MapResolver {
    values: BTreeMap<String, String>,
}

impl SecretResolver for MapResolver {
    fn name(&self) -> &'static str {
        "map"
    }

    fn available(&self) -> bool {
        true
    }

    fn resolve(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }
}

fn chain_with(values: &[(&str, &str)]) -> SecretChain {
    SecretChain::with_resolvers(vec![Box::new(MapResolver {
        values: values.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
    })])
}

fn empty_chain() -> SecretChain {
    SecretChain::with_resolvers(vec![])
}

fn server(name: &str, secrets: &[(&str, &str)]) -> McpServerDef {
    McpServerDef {
        name: name.into(),
        command: "npx".into(),
        args: vec!["-y".into()],
        env: BTreeMap::new(),
        secrets: secrets.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
    }
}

fn full_profile() -> Profile {
    let mut profile = Profile::new("full".into());
    profile.plugins = vec!["new-plugin@acme".parse().unwrap()];
    profile.mcp_servers = vec![server("github", &[])];
    profile.marketplaces = vec![MarketplaceRef {
        name: "acme".into(),
        source: MarketplaceSource::Github { repo: "acme/plugins".into() },
    }];
    profile
}

fn state_with_strays() -> CurrentState {
    let mut state = CurrentState::default();
    state.plugins.insert("old-plugin@acme".parse().unwrap());
    state.mcp_servers.insert("stale-server".into());
    state
}

#[test]
fn test_removals_before_installs_marketplace_before_plugin() {
    let profile = full_profile();
    let diff = ProfileDiff::compute(&profile, &state_with_strays());

    let runner = ScriptedRunner::new();
    let cli = ClaudeCli::new(&runner);
    let result = apply(&profile, &diff, &cli, &empty_chain()).unwrap();
    assert!(result.is_clean());

    let uninstall = runner.position_of("uninstall");
    let mcp_remove = runner.position_of("stale-server");
    let marketplace_add = runner.position_of("acme/plugins");
    let install = runner.position_of("new-plugin@acme");
    let mcp_add = runner.position_of("github");

    assert!(uninstall < marketplace_add, "removals run before any addition");
    assert!(mcp_remove < marketplace_add, "removals run before any addition");
    assert!(marketplace_add < install, "marketplace add runs before plugin install");
    assert!(install < mcp_add);
}

#[test]
fn test_tallies_count_applied_operations() {
    let profile = full_profile();
    let diff = ProfileDiff::compute(&profile, &state_with_strays());

    let runner = ScriptedRunner::new();
    let cli = ClaudeCli::new(&runner);
    let result = apply(&profile, &diff, &cli, &empty_chain()).unwrap();

    assert_eq!(result.plugins.removed, 1);
    assert_eq!(result.plugins.installed, 1);
    assert_eq!(result.mcp_servers.removed, 1);
    assert_eq!(result.mcp_servers.installed, 1);
    assert_eq!(result.marketplaces.installed, 1);
}

#[test]
fn test_already_states_are_not_errors() {
    let profile = full_profile();
    let diff = ProfileDiff::compute(&profile, &state_with_strays());

    let runner = ScriptedRunner::new()
        .with_failure("new-plugin@acme", "Error: plugin is already installed")
        .with_failure("stale-server", "No MCP server found with name: stale-server");
    let cli = ClaudeCli::new(&runner);
    let result = apply(&profile, &diff, &cli, &empty_chain()).unwrap();

    assert!(result.is_clean());
    assert_eq!(result.plugins.already_present, 1);
    assert_eq!(result.mcp_servers.already_removed, 1);
}

#[test]
fn test_one_failure_does_not_stop_the_batch() {
    let mut profile = full_profile();
    profile.plugins.push("second-plugin@acme".parse().unwrap());
    let diff = ProfileDiff::compute(&profile, &CurrentState::default());

    let runner =
        ScriptedRunner::new().with_failure("new-plugin@acme", "network timeout");
    let cli = ClaudeCli::new(&runner);
    let result = apply(&profile, &diff, &cli, &empty_chain()).unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].category, Category::Plugins);
    assert_eq!(result.errors[0].item, "new-plugin@acme");
    // the second plugin and the MCP server were still processed
    assert_eq!(result.plugins.installed, 1);
    assert_eq!(result.mcp_servers.installed, 1);
}

#[test]
fn test_secret_failure_aborts_only_that_server() {
    let mut profile = full_profile();
    profile.mcp_servers = vec![
        server("needs-secret", &[("API_TOKEN", "missing-secret")]),
        server("plain", &[]),
    ];
    let diff = ProfileDiff::compute(&profile, &CurrentState::default());

    let runner = ScriptedRunner::new();
    let cli = ClaudeCli::new(&runner);
    let result = apply(&profile, &diff, &cli, &empty_chain()).unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item, "needs-secret");
    assert_eq!(result.mcp_servers.installed, 1);

    // no mcp add was ever issued for the failed server
    let adds: Vec<_> = runner
        .calls()
        .into_iter()
        .filter(|call| call.first().map(String::as_str) == Some("mcp") && call[1] == "add")
        .collect();
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0][2], "plain");
}

#[test]
fn test_resolved_secrets_are_passed_as_env() {
    let mut profile = Profile::new("p".into());
    profile.mcp_servers = vec![server("github", &[("GITHUB_TOKEN", "github-token")])];
    let diff = ProfileDiff::compute(&profile, &CurrentState::default());

    let runner = ScriptedRunner::new();
    let cli = ClaudeCli::new(&runner);
    let chain = chain_with(&[("github-token", "tok-123")]);
    let result = apply(&profile, &diff, &cli, &chain).unwrap();

    assert!(result.is_clean());
    let call = &runner.calls()[0];
    let env_index = call.iter().position(|a| a == "--env").unwrap();
    assert_eq!(call[env_index + 1], "GITHUB_TOKEN=tok-123");
}

#[test]
fn test_secret_error_message_names_the_secret() {
    let mut profile = Profile::new("p".into());
    profile.mcp_servers = vec![server("github", &[("TOKEN", "vault-token")])];
    let diff = ProfileDiff::compute(&profile, &CurrentState::default());

    let runner = ScriptedRunner::new();
    let cli = ClaudeCli::new(&runner);
    let result = apply(&profile, &diff, &cli, &empty_chain()).unwrap();

    assert!(result.errors[0].message.contains("vault-token"));
    assert!(matches!(
        empty_chain().resolve("vault-token"),
        Err(CoreError::SecretUnresolved { .. })
    ));
}
