//! One-shot avatar generation.

use aionic_core::avatar::{self, ERROR_SLOGAN};
use aionic_core::genai::service_from_config;
use aionic_core::{AvatarOptions, Generator};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::cli::AvatarArgs;
use crate::config::Config;

pub async fn execute(args: AvatarArgs, config: &Config) -> Result<()> {
    let generation = &config.universe.generation;
    let service = service_from_config(generation)?;
    let generator = Generator::new(service, generation.request_timeout());

    let options = AvatarOptions {
        base_body: args.body,
        appearance: args.appearance,
        clothing: args.clothing,
    };

    let spinner = spinner(&format!("Manifesting {}", options.description()));
    let outcome = avatar::create(&generator, &options).await;
    spinner.finish_and_clear();

    let created = match outcome {
        Ok(created) => created,
        Err(e) => {
            println!("{}", format!("Failed to create an avatar. {}", e).red());
            println!("  {}", ERROR_SLOGAN.italic());
            anyhow::bail!("avatar generation failed");
        }
    };

    println!("{}", "Avatar manifested".green().bold());
    println!("  {}", created.slogan.italic());

    if let Some(path) = args.out {
        let bytes = created.image.decode()?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "  {} {} ({} bytes, {})",
            "✓ saved".green(),
            path.display(),
            bytes.len(),
            created.image.mime_type
        );
    }

    Ok(())
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
