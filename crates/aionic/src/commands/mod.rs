//! Command implementations for aionic CLI.
//!
//! Each submodule implements the logic for one subcommand.

pub mod avatar;
pub mod doctor;
pub mod list;
pub mod render;
pub mod run;
pub mod shell;
pub mod thought;

use aionic_core::{Universe, UniverseConfig, UniverseHandle, Viewport};
use anyhow::{Context, Result};
use tokio::task::JoinHandle;

/// Start a universe from config, optionally forcing the mobile layout.
pub fn start_universe(
    mut config: UniverseConfig,
    mobile: bool,
) -> Result<(UniverseHandle, JoinHandle<()>)> {
    if mobile {
        config.viewport = Viewport::Mobile;
    }
    let universe = Universe::from_config(config).context("Failed to set up the universe")?;
    Ok(universe.start())
}
