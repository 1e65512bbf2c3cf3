//! Diagnostics command.

use aionic_core::catalog::Catalog;
use aionic_core::genai::service_from_config;
use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, KeySource};

pub fn execute(config: &Config) -> Result<()> {
    println!("{}", "aionic Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();
    let generation = &config.universe.generation;

    // Check config file
    print!("  Config file ({}): ", config.path.display());
    if config.file_found {
        println!("{}", "✓ loaded".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check API key
    print!("  API key: ");
    match config.key_source {
        Some(KeySource::Env(name)) => println!("{}", format!("✓ from ${}", name).green()),
        Some(KeySource::File) => println!("{}", "✓ from config file".green()),
        None => {
            println!("{}", "✗ missing".red());
            issues.push("No API key: set GEMINI_API_KEY; thoughts and slogans will use fallbacks");
        }
    }

    // Check generation client
    print!("  Generation client: ");
    match service_from_config(generation) {
        Ok(_) if generation.has_api_key() => println!("{}", "✓ ready".green()),
        Ok(_) => println!("{}", "○ offline".yellow()),
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push("Failed to build the HTTP client");
        }
    }
    println!("    endpoint:    {}", generation.base_url);
    println!("    text model:  {}", generation.text_model);
    println!("    image model: {}", generation.image_model);
    println!("    timeout:     {}s", generation.request_timeout_secs);

    // Check catalog
    print!("  Catalog: ");
    let catalog = Catalog::builtin();
    let committing = catalog.iter().filter(|c| c.ledger_committing).count();
    println!(
        "{}",
        format!("✓ {} commands ({} ledger)", catalog.len(), committing).green()
    );

    // Timings
    let timing = &config.universe.timing;
    println!();
    println!("  {}", "Timings:".cyan());
    println!("    focus move:   {}ms (+{}ms shake)", timing.focus_move_ms, timing.impact_shake_ms);
    println!("    line delay:   {}ms", timing.line_delay_ms);
    println!("    cooldown:     {}ms", timing.cooldown_ms);
    println!("    idle thought: {}s", timing.idle_thought_secs);

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}
