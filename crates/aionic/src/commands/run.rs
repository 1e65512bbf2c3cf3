//! Execute catalog commands in sequence.

use aionic_core::{SelectOutcome, UniverseSnapshot};
use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use tracing::debug;

use super::{render, start_universe};
use crate::config::Config;
use crate::error::CliError;

pub async fn execute(names: &[String], mobile: bool, config: Config) -> Result<()> {
    let (universe, task) = start_universe(config.universe, mobile)?;

    // Fail before anything plays.
    for name in names {
        if universe.catalog().resolve(name).is_none() {
            return Err(CliError::UnknownCommand(name.clone()).into());
        }
    }

    let printer = render::spawn_printer(&universe);

    for name in names {
        match universe.select(name.as_str()).await? {
            SelectOutcome::Accepted { command_id } => {
                debug!(command = %command_id, "Waiting for command to finish");
            }
            SelectOutcome::Rejected { phase } => {
                println!(
                    "{}",
                    format!("  {} rejected while {}", name, phase.as_str()).red()
                );
                continue;
            }
        }
        universe.wait_until_idle().await?;
    }

    let snapshot = universe.snapshot().await?;
    printer.finish().await;
    universe.shutdown().await?;
    let _ = task.await;

    print_summary(names.len(), &snapshot);
    Ok(())
}

fn print_summary(count: usize, snapshot: &UniverseSnapshot) {
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  Commands run:  {}", count);
    println!("  Ledger block:  {}", snapshot.block.to_string().yellow());
    println!(
        "  Harmony panel: {}",
        if snapshot.panel_visible { "open" } else { "closed" }
    );
    println!("  Last thought:  {}", snapshot.thought.text.italic());
    println!("  Finished at:   {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
}
