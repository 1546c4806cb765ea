//! MCP server listing command

use loadout_registry::{ClientConfig, Paths};

/// List configured MCP servers with their command lines
pub fn list(paths: &Paths, json: bool) -> anyhow::Result<()> {
    let config = ClientConfig::load(paths)?;
    let servers = config.servers();

    if json {
        println!("{}", serde_json::to_string_pretty(&servers)?);
        return Ok(());
    }

    if servers.is_empty() {
        println!("No MCP servers configured.");
        return Ok(());
    }

    println!("MCP servers:");
    for (name, server) in &servers {
        println!("  {name} - {}", server.display());
    }
    Ok(())
}
