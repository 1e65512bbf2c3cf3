//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Aionic universe terminal host
///
/// Execute commands, create avatars and listen to the universe think.
#[derive(Parser, Debug)]
#[command(name = "aionic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the command catalog
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Execute commands one after another
    Run {
        /// Command names or ids (e.g. AWAKEN 4)
        #[arg(required = true)]
        names: Vec<String>,

        /// Use the mobile camera layout
        #[arg(long)]
        mobile: bool,
    },

    /// Generate an avatar portrait and slogan
    Avatar(AvatarArgs),

    /// Generate a single ambient thought
    Thought {
        /// What the thought should react to
        #[arg(short, long, value_enum, default_value_t = ThoughtKind::Idle)]
        context: ThoughtKind,

        /// Command for command/commit thoughts (defaults to the first in the catalog)
        #[arg(long)]
        command: Option<String>,
    },

    /// Interactive universe session
    Shell {
        /// Use the mobile camera layout
        #[arg(long)]
        mobile: bool,
    },

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}

#[derive(Args, Debug)]
pub struct AvatarArgs {
    /// Base body type (e.g. humanoid, cyborg)
    #[arg(long)]
    pub body: String,

    /// Appearance details
    #[arg(long)]
    pub appearance: String,

    /// Clothing description
    #[arg(long)]
    pub clothing: String,

    /// Write the decoded portrait to this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThoughtKind {
    Idle,
    Command,
    Commit,
}
