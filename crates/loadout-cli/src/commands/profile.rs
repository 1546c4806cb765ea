//! Profile CLI commands
//!
//! Handles: loadout profile list/show/create/clone/delete/use

use std::io::{self, Write};

use anyhow::bail;
use clap::Subcommand;

use loadout_core::apply::{apply, ApplyResult};
use loadout_core::exec::{ClaudeCli, SystemRunner};
use loadout_core::profile::{snapshot, ProfileStore};
use loadout_core::secrets::SecretChain;
use loadout_core::state::{ActiveState, CurrentState};
use loadout_core::ProfileDiff;
use loadout_registry::Paths;

/// Profile commands
#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List all profiles
    List,
    /// Show profile details
    Show {
        /// Profile name
        name: String,
    },
    /// Create a profile from the current installed state
    Create {
        /// Profile name
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Copy a profile under a new name
    Clone {
        /// Source profile name
        source: String,
        /// New profile name
        dest: String,
    },
    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Apply a profile to this machine
    Use {
        /// Profile name
        name: String,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
}

/// Execute a profile command
pub fn execute(cmd: ProfileCommands, paths: &Paths, non_interactive: bool) -> anyhow::Result<()> {
    let store = ProfileStore::new(paths);

    match cmd {
        ProfileCommands::List => {
            let profiles = store.list()?;
            if profiles.is_empty() {
                println!("No profiles found.");
            } else {
                println!("Profiles:");
                for p in profiles {
                    let desc = p.description.as_deref().unwrap_or("No description");
                    println!("  {} - {} ({} plugins)", p.name, desc, p.plugins.len());
                }
            }
            Ok(())
        }
        ProfileCommands::Show { name } => {
            let profile = store.load(&name)?;

            println!("Profile: {}", profile.name);
            if let Some(desc) = &profile.description {
                println!("Description: {desc}");
            }
            println!("Created: {}", profile.created_at);
            println!("Updated: {}", profile.updated_at);

            println!("\nPlugins ({}):", profile.plugins.len());
            for key in &profile.plugins {
                println!("  {key}");
            }
            println!("\nMCP servers ({}):", profile.mcp_servers.len());
            for server in &profile.mcp_servers {
                let secrets = if server.secrets.is_empty() {
                    String::new()
                } else {
                    format!(" ({} secrets)", server.secrets.len())
                };
                println!("  {} - {} {}{secrets}", server.name, server.command, server.args.join(" "));
            }
            println!("\nMarketplaces ({}):", profile.marketplaces.len());
            for marketplace in &profile.marketplaces {
                println!("  {} - {}", marketplace.name, marketplace.source.location());
            }
            if !profile.detect.is_empty() {
                println!("\nDetect rules: {}", profile.detect.len());
            }
            if !profile.sandbox.mounts.is_empty() || !profile.sandbox.env.is_empty() {
                println!(
                    "Sandbox: {} mounts, {} env vars",
                    profile.sandbox.mounts.len(),
                    profile.sandbox.env.len()
                );
            }
            Ok(())
        }
        ProfileCommands::Create { name, description } => {
            if store.exists(&name) {
                bail!("profile '{name}' already exists");
            }

            let mut profile = snapshot(paths, name)?;
            profile.description = description;
            store.save(&mut profile)?;

            println!(
                "Created profile '{}' ({} plugins, {} MCP servers, {} marketplaces)",
                profile.name,
                profile.plugins.len(),
                profile.mcp_servers.len(),
                profile.marketplaces.len()
            );
            Ok(())
        }
        ProfileCommands::Clone { source, dest } => {
            let cloned = store.clone_profile(&source, &dest)?;
            println!("Cloned '{source}' to '{}'", cloned.name);
            Ok(())
        }
        ProfileCommands::Delete { name, force } => {
            if !store.exists(&name) {
                bail!("profile '{name}' not found");
            }

            if !force {
                if non_interactive {
                    bail!("refusing to delete without --force in non-interactive mode");
                }
                print!("Delete profile '{name}'? [y/N] ");
                io::stdout().flush()?;
                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            store.delete(&name)?;
            println!("Deleted profile: {name}");
            Ok(())
        }
        ProfileCommands::Use { name, dry_run } => {
            if dry_run {
                preview_profile(paths, &name)
            } else {
                use_profile(paths, &name, false)
            }
        }
    }
}

fn print_plan(diff: &ProfileDiff) {
    if !diff.plugins_to_remove.is_empty() {
        println!("Remove plugins:");
        for key in &diff.plugins_to_remove {
            println!("  - {key}");
        }
    }
    if !diff.mcp_to_remove.is_empty() {
        println!("Remove MCP servers:");
        for name in &diff.mcp_to_remove {
            println!("  - {name}");
        }
    }
    if !diff.marketplaces_to_add.is_empty() {
        println!("Add marketplaces:");
        for marketplace in &diff.marketplaces_to_add {
            println!("  + {} ({})", marketplace.name, marketplace.source.location());
        }
    }
    if !diff.plugins_to_install.is_empty() {
        println!("Install plugins:");
        for key in &diff.plugins_to_install {
            println!("  + {key}");
        }
    }
    if !diff.mcp_to_install.is_empty() {
        println!("Install MCP servers:");
        for name in &diff.mcp_to_install {
            println!("  + {name}");
        }
    }
}

fn print_result(result: &ApplyResult) {
    println!(
        "Plugins: {} installed, {} removed, {} already present, {} already removed",
        result.plugins.installed,
        result.plugins.removed,
        result.plugins.already_present,
        result.plugins.already_removed
    );
    println!(
        "MCP servers: {} installed, {} removed, {} already present, {} already removed",
        result.mcp_servers.installed,
        result.mcp_servers.removed,
        result.mcp_servers.already_present,
        result.mcp_servers.already_removed
    );
    println!(
        "Marketplaces: {} added, {} already present",
        result.marketplaces.installed, result.marketplaces.already_present
    );

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in &result.errors {
            println!("  {error}");
        }
    }
}

/// Show what applying a profile would do
fn preview_profile(paths: &Paths, name: &str) -> anyhow::Result<()> {
    let store = ProfileStore::new(paths);
    let profile = store.load(name)?;
    let state = CurrentState::observe(paths)?;
    let diff = ProfileDiff::compute(&profile, &state);

    if diff.is_empty() {
        println!("Nothing to do - profile and state are both empty.");
        return Ok(());
    }

    print_plan(&diff);
    println!("\nDry run - no changes made.");
    Ok(())
}

/// Diff and apply a profile, recording it as active on a clean run
pub fn use_profile(paths: &Paths, name: &str, quiet_plan: bool) -> anyhow::Result<()> {
    let store = ProfileStore::new(paths);
    let profile = store.load(name)?;
    let state = CurrentState::observe(paths)?;
    let diff = ProfileDiff::compute(&profile, &state);

    if diff.is_empty() {
        println!("Nothing to do - profile and state are both empty.");
        ActiveState::record_applied(paths, name)?;
        return Ok(());
    }

    if !quiet_plan {
        print_plan(&diff);
        println!();
    }

    let runner = SystemRunner;
    let cli = ClaudeCli::new(&runner);
    let secrets = SecretChain::standard();
    let result = apply(&profile, &diff, &cli, &secrets)?;

    print_result(&result);

    if result.is_clean() {
        ActiveState::record_applied(paths, name)?;
        println!("\nProfile '{name}' applied.");
        Ok(())
    } else {
        bail!("{} operations failed", result.errors.len());
    }
}
