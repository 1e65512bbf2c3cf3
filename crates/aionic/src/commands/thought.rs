//! Single ambient thought.

use aionic_core::catalog::Catalog;
use aionic_core::genai::service_from_config;
use aionic_core::{Generator, ThoughtContext};
use anyhow::Result;
use colored::Colorize;

use super::avatar::spinner;
use crate::cli::ThoughtKind;
use crate::config::Config;
use crate::error::{CliError, CliResult};

pub async fn execute(kind: ThoughtKind, command: Option<&str>, config: &Config) -> Result<()> {
    let context = build_context(kind, command, &Catalog::builtin())?;

    let generation = &config.universe.generation;
    let service = service_from_config(generation)?;
    let generator = Generator::new(service, generation.request_timeout());

    let spinner = spinner("Listening to the universe");
    let text = generator.thought(&context).await;
    spinner.finish_and_clear();

    println!("{}", text.italic().purple());
    Ok(())
}

fn build_context(
    kind: ThoughtKind,
    command: Option<&str>,
    catalog: &Catalog,
) -> CliResult<ThoughtContext> {
    if kind == ThoughtKind::Idle {
        return Ok(ThoughtContext::Idle);
    }

    let command = match command {
        Some(key) => catalog
            .resolve(key)
            .ok_or_else(|| CliError::UnknownCommand(key.to_string()))?,
        None => catalog
            .iter()
            .next()
            .ok_or_else(|| CliError::InvalidInput("the catalog is empty".to_string()))?,
    }
    .clone();

    Ok(match kind {
        ThoughtKind::Commit => ThoughtContext::LedgerCommitted { command },
        _ => ThoughtContext::CommandExecuted { command },
    })
}
