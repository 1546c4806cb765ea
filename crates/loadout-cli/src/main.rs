//! Loadout CLI - declarative profiles for Claude Code installation state
//!
//! Provides `loadout status`, `loadout profile`, `loadout doctor`, and
//! friends. All mutating side effects go through the external `claude`
//! CLI; this binary only diffs, reconciles, and edits local JSON state.

mod commands;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use loadout_core::doctor;
use loadout_core::exec::{ClaudeCli, SystemRunner};
use loadout_core::profile::{suggest, ProfileStore};
use loadout_core::secrets::SecretChain;
use loadout_core::state::{ActiveState, CurrentState};
use loadout_core::ProfileDiff;
use loadout_registry::cleanup::CleanupReport;
use loadout_registry::{MarketplaceRegistry, Paths};

use commands::profile::ProfileCommands;

#[derive(Parser)]
#[command(name = "loadout")]
#[command(about = "Loadout - declarative profiles for Claude Code")]
#[command(version)]
struct Cli {
    /// Alternate root directory for all managed state (defaults to home)
    #[arg(long, global = true, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    /// Never prompt; confirmations default to abort
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show installed state and the active profile
    Status,
    /// Run health checks
    Doctor,
    /// Prune registry entries whose install path is gone
    Cleanup {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
        /// Preview what would be pruned without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Enable an installed plugin
    Enable {
        /// Plugin key (name@marketplace)
        plugin: String,
    },
    /// Disable an installed plugin
    Disable {
        /// Plugin key (name@marketplace)
        plugin: String,
    },
    /// List installed plugins
    Plugins {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List known marketplaces
    Marketplaces {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured MCP servers
    Mcp {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },
    /// Pick a profile for this machine and apply it
    Setup {
        /// Profile to apply (suggested from the current directory if omitted)
        #[arg(long)]
        profile: Option<String>,
    },
    /// Print the docker invocation for a profile's sandbox
    Sandbox {
        /// Profile to resolve (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
    /// Update marketplaces and re-apply the active profile
    Update {
        /// Marketplace to update (all known if omitted)
        marketplace: Option<String>,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("LOADOUT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::resolve(cli.config_dir)?;
    let non_interactive = cli.non_interactive;

    match cli.command {
        Commands::Status => run_status(&paths),
        Commands::Doctor => run_doctor(&paths),
        Commands::Cleanup { force, dry_run } => {
            run_cleanup(&paths, force, dry_run, non_interactive)
        }
        Commands::Enable { plugin } => commands::plugins::set_enabled(&paths, &plugin, true),
        Commands::Disable { plugin } => commands::plugins::set_enabled(&paths, &plugin, false),
        Commands::Plugins { json } => commands::plugins::list(&paths, json),
        Commands::Marketplaces { json } => commands::marketplace::list(&paths, json),
        Commands::Mcp { json } => commands::mcp::list(&paths, json),
        Commands::Profile { action } => commands::profile::execute(action, &paths, non_interactive),
        Commands::Setup { profile } => run_setup(&paths, profile, non_interactive),
        Commands::Sandbox { profile } => run_sandbox(&paths, profile),
        Commands::Update { marketplace } => run_update(&paths, marketplace),
    }
}

/// Ask a yes/no question; non-interactive mode answers no
fn confirm(prompt: &str, non_interactive: bool) -> anyhow::Result<bool> {
    if non_interactive {
        return Ok(false);
    }
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn run_status(paths: &Paths) -> anyhow::Result<()> {
    let state = CurrentState::observe(paths)?;
    let active = ActiveState::load(paths)?;

    println!("Installed plugins: {}", state.plugins.len());
    println!("MCP servers: {}", state.mcp_servers.len());
    println!("Marketplaces: {}", state.marketplaces.len());

    match active.profile {
        Some(name) => {
            println!("Active profile: {name}");
            if let Some(applied_at) = active.applied_at {
                println!("Last applied: {}", applied_at.format("%Y-%m-%d %H:%M"));
            }

            let store = ProfileStore::new(paths);
            match store.load(&name) {
                Ok(profile) => {
                    let diff = ProfileDiff::compute(&profile, &state);
                    if diff.plugins_to_remove.is_empty() && diff.mcp_to_remove.is_empty()
                        && diff.marketplaces_to_add.is_empty()
                    {
                        println!("State matches the profile.");
                    } else {
                        println!(
                            "Pending changes: {} removals, {} marketplace additions (run 'loadout profile use {name}')",
                            diff.plugins_to_remove.len() + diff.mcp_to_remove.len(),
                            diff.marketplaces_to_add.len()
                        );
                    }
                }
                Err(e) => println!("Active profile cannot be loaded: {e}"),
            }
        }
        None => println!("Active profile: none"),
    }

    Ok(())
}

fn run_doctor(paths: &Paths) -> anyhow::Result<()> {
    let runner = SystemRunner;
    let cli = ClaudeCli::new(&runner);
    let secrets = SecretChain::standard();

    let checks = doctor::run(paths, &cli, &secrets);
    for check in &checks {
        println!("[{}] {} - {}", check.status, check.name, check.detail);
    }

    if doctor::has_failures(&checks) {
        bail!("one or more checks failed");
    }
    Ok(())
}

fn run_cleanup(
    paths: &Paths,
    force: bool,
    dry_run: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let report = CleanupReport::scan(paths)?;

    if report.is_clean() {
        println!("No orphaned registry entries ({} checked).", report.checked);
        return Ok(());
    }

    println!("Orphaned registry entries:");
    for entry in &report.orphaned {
        println!("  {} (missing: {})", entry.key, entry.install_path.display());
    }

    if dry_run {
        println!("\nDry run - no changes made.");
        return Ok(());
    }

    if !force && !confirm("\nPrune these entries?", non_interactive)? {
        println!("Cancelled.");
        return Ok(());
    }

    let removed = report.prune(paths)?;
    println!("Pruned {removed} entries.");
    Ok(())
}

fn run_setup(
    paths: &Paths,
    profile_flag: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = ProfileStore::new(paths);

    let name = match profile_flag {
        Some(name) => name,
        None => {
            let profiles = store.list()?;
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            let Some(suggested) = suggest(&profiles, &cwd) else {
                bail!("no profile matches this directory; pass --profile <name>");
            };

            println!("Detected profile '{}' for {}", suggested.name, cwd.display());
            let name = suggested.name.clone();
            if !non_interactive && !confirm("Apply it?", false)? {
                println!("Cancelled.");
                return Ok(());
            }
            name
        }
    };

    commands::profile::use_profile(paths, &name, false)
}

fn run_sandbox(paths: &Paths, profile_flag: Option<String>) -> anyhow::Result<()> {
    let name = match profile_flag {
        Some(name) => name,
        None => ActiveState::load(paths)?
            .profile
            .ok_or_else(|| anyhow::anyhow!("no active profile; pass --profile <name>"))?,
    };

    let store = ProfileStore::new(paths);
    let profile = store.load(&name)?;
    let sandbox = &profile.sandbox;
    let secrets = SecretChain::standard();

    let mut args: Vec<String> = vec!["run".into(), "--rm".into(), "-it".into()];
    for mount in &sandbox.mounts {
        let mut spec = format!("{}:{}", mount.source.display(), mount.target.display());
        if mount.read_only {
            spec.push_str(":ro");
        }
        args.push("-v".into());
        args.push(spec);
    }
    for (key, value) in &sandbox.env {
        args.push("-e".into());
        args.push(format!("{key}={value}"));
    }
    for (var, secret_name) in &sandbox.secrets {
        let value = secrets.resolve(secret_name)?;
        args.push("-e".into());
        args.push(format!("{var}={value}"));
    }

    println!("docker {}", args.join(" "));
    Ok(())
}

fn run_update(paths: &Paths, marketplace: Option<String>) -> anyhow::Result<()> {
    let registry = MarketplaceRegistry::load(paths)?;
    let targets: Vec<String> = match marketplace {
        Some(name) => {
            if !registry.contains(&name) {
                bail!("marketplace '{name}' is not registered");
            }
            vec![name]
        }
        None => registry.names().cloned().collect(),
    };

    if targets.is_empty() {
        println!("No marketplaces to update.");
    }

    let runner = SystemRunner;
    let cli = ClaudeCli::new(&runner);
    let mut failures = Vec::new();

    for target in &targets {
        let output = cli.marketplace_update(Some(target))?;
        if output.success {
            println!("Updated marketplace {target}");
        } else {
            let message = output.error_text();
            println!("Failed to update marketplace {target}: {message}");
            failures.push(format!("{target}: {message}"));
        }
    }

    if let Some(active) = ActiveState::load(paths)?.profile {
        println!("\nRe-applying active profile '{active}'...");
        commands::profile::use_profile(paths, &active, false)?;
    }

    if !failures.is_empty() {
        bail!("{} marketplace updates failed", failures.len());
    }
    Ok(())
}
