//! Configuration management for aionic.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (GEMINI_API_KEY, then API_KEY)
//! 2. Config file (AIONIC_CONFIG, or config.toml in the platform config dir)
//! 3. Default values

use aionic_core::UniverseConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::CliResult;

/// Environment variables checked for an API key, in order.
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Where the API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    File,
    Env(&'static str),
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct Config {
    pub universe: UniverseConfig,
    pub path: PathBuf,
    pub file_found: bool,
    pub key_source: Option<KeySource>,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        Self::load_with(&Self::config_path(), |name| std::env::var(name).ok())
    }

    /// Load from `path`, resolving environment variables through `env`.
    pub fn load_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file_found = path.exists();

        let mut universe = if file_found {
            parse_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?
        } else {
            UniverseConfig::default()
        };

        let mut key_source = universe.generation.has_api_key().then_some(KeySource::File);
        for name in API_KEY_VARS {
            if let Some(key) = env(name).filter(|k| !k.trim().is_empty()) {
                universe.generation.api_key = Some(key);
                key_source = Some(KeySource::Env(name));
                break;
            }
        }

        Ok(Self {
            universe,
            path: path.to_path_buf(),
            file_found,
            key_source,
        })
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("AIONIC_CONFIG") {
            PathBuf::from(path)
        } else {
            default_config_dir().join("config.toml")
        }
    }
}

/// Read and parse a config file.
pub fn parse_file(path: &Path) -> CliResult<UniverseConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Parse a `config.toml` body.
pub fn parse(content: &str) -> CliResult<UniverseConfig> {
    Ok(toml::from_str(content)?)
}

fn default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "aionic", "aionic") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".aionic")
    }
}
