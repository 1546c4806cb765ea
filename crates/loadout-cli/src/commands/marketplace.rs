//! Marketplace listing command

use loadout_registry::{MarketplaceRegistry, MarketplaceSource, Paths};

/// List known marketplaces with their sources
pub fn list(paths: &Paths, json: bool) -> anyhow::Result<()> {
    let registry = MarketplaceRegistry::load(paths)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&registry)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No marketplaces known.");
        return Ok(());
    }

    println!("Known marketplaces:");
    for (name, entry) in registry.iter() {
        let kind = match &entry.source {
            MarketplaceSource::Github { .. } => "github",
            MarketplaceSource::Git { .. } => "git",
        };
        println!("  {name} - {kind}:{}", entry.source.location());
    }
    Ok(())
}
