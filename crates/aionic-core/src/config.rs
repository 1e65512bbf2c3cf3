//! Universe configuration.
//!
//! Timings, buffer sizes and generation settings for the coordinator.
//! Every field has a default, so a partial `config.toml` section is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::layout::Viewport;

/// Top-level configuration for a universe instance
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UniverseConfig {
    /// Animation and playback timings
    pub timing: TimingConfig,

    /// Simulated terminal settings
    pub output: OutputConfig,

    /// Viewport used to lay out focus targets
    pub viewport: Viewport,

    /// External generative service settings
    pub generation: GenerationConfig,
}

impl UniverseConfig {
    /// Reject settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.output.capacity == 0 {
            return Err(Error::config("output.capacity must be at least 1"));
        }
        let generation = &self.generation;
        if generation.request_timeout_secs == 0 {
            return Err(Error::config("generation.request_timeout_secs must be at least 1"));
        }
        for (field, value) in [
            ("generation.base_url", &generation.base_url),
            ("generation.text_model", &generation.text_model),
            ("generation.image_model", &generation.image_model),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }
}

/// Timings in milliseconds (seconds for the thought intervals)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Camera move animation (default: 1000)
    pub focus_move_ms: u64,

    /// Impact shake after arriving at a command glyph (default: 300)
    pub impact_shake_ms: u64,

    /// Shake intensity in world units (default: 0.15)
    pub impact_shake_intensity: f32,

    /// Delay before each script line (default: 500)
    pub line_delay_ms: u64,

    /// Delay before a ledger commit (default: 500)
    pub commit_delay_ms: u64,

    /// Delay before the completion line (default: 600)
    pub completion_delay_ms: u64,

    /// Time the output stays visible after completion (default: 3000)
    pub cooldown_ms: u64,

    /// Inactivity before an idle thought is requested (default: 20)
    pub idle_thought_secs: u64,

    /// How long a new thought stays visible (default: 7)
    pub thought_display_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            focus_move_ms: 1000,
            impact_shake_ms: 300,
            impact_shake_intensity: 0.15,
            line_delay_ms: 500,
            commit_delay_ms: 500,
            completion_delay_ms: 600,
            cooldown_ms: 3000,
            idle_thought_secs: 20,
            thought_display_secs: 7,
        }
    }
}

impl TimingConfig {
    pub fn focus_move(&self) -> Duration {
        Duration::from_millis(self.focus_move_ms)
    }

    pub fn impact_shake(&self) -> Duration {
        Duration::from_millis(self.impact_shake_ms)
    }

    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }

    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn idle_thought(&self) -> Duration {
        Duration::from_secs(self.idle_thought_secs)
    }

    pub fn thought_display(&self) -> Duration {
        Duration::from_secs(self.thought_display_secs)
    }
}

/// Simulated terminal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Maximum number of retained lines (default: 20)
    pub capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { capacity: 20 }
    }
}

/// Generative service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// API key; generation runs offline (fallbacks only) when unset
    pub api_key: Option<String>,

    /// REST base URL
    pub base_url: String,

    /// Model used for slogans and thoughts
    pub text_model: String,

    /// Model used for avatar portraits
    pub image_model: String,

    /// Upper bound for a single external call in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether a non-empty API key is present
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}
