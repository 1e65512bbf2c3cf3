//! aionic - Aionic universe terminal host
//!
//! Runs the universe coordinator without a renderer: command playback,
//! camera moves, ledger commits and ambient thoughts are printed instead.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;
mod error;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let directive = if cli.verbose { "aionic=debug" } else { "aionic=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    // Load configuration
    let config = config::Config::load()?;

    // Execute command
    match cli.command {
        Commands::List { json } => commands::list::execute(json),
        Commands::Run { names, mobile } => commands::run::execute(&names, mobile, config).await,
        Commands::Avatar(args) => commands::avatar::execute(args, &config).await,
        Commands::Thought { context, command } => {
            commands::thought::execute(context, command.as_deref(), &config).await
        }
        Commands::Shell { mobile } => commands::shell::execute(mobile, config).await,
        Commands::Doctor => commands::doctor::execute(&config),
        Commands::Version => {
            println!("aionic {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
