//! Catalog listing.

use aionic_core::catalog::{Catalog, Command};
use anyhow::Result;
use colored::Colorize;

pub fn execute(json: bool) -> Result<()> {
    let catalog = Catalog::builtin();

    if json {
        let commands: Vec<&Command> = catalog.iter().map(|c| c.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&commands)?);
        return Ok(());
    }

    println!("{}", "Aionic Commands".cyan().bold());
    println!("{}", "─".repeat(50));
    for command in catalog.iter() {
        let ledger = if command.ledger_committing {
            " ⛓ ledger".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {:<10} {}{}",
            command.id.dimmed(),
            command.name.bold(),
            command.glyph.as_str().dimmed(),
            ledger
        );
        println!("      {}", command.description);
    }

    Ok(())
}
