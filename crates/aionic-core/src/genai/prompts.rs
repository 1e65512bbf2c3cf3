//! Prompt construction and fallback text for every generation context.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::Command;

/// Visitor choices for a new avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarOptions {
    pub base_body: String,
    pub appearance: String,
    pub clothing: String,
}

impl AvatarOptions {
    /// One-sentence description used for the slogan request.
    pub fn description(&self) -> String {
        format!(
            "A character with a {} body, featuring {}, and wearing {}.",
            self.base_body, self.appearance, self.clothing
        )
    }
}

/// Why an ambient thought is being requested.
#[derive(Debug, Clone, PartialEq)]
pub enum ThoughtContext {
    AvatarCreated {
        options: AvatarOptions,
        slogan: String,
    },
    LedgerCommitted {
        command: Arc<Command>,
    },
    CommandExecuted {
        command: Arc<Command>,
    },
    Idle,
}

impl ThoughtContext {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThoughtContext::AvatarCreated { .. } => "avatar_created",
            ThoughtContext::LedgerCommitted { .. } => "ledger_committed",
            ThoughtContext::CommandExecuted { .. } => "command_executed",
            ThoughtContext::Idle => "idle",
        }
    }

    /// Text shown when the service cannot produce a thought.
    pub fn fallback(&self) -> &'static str {
        match self {
            ThoughtContext::AvatarCreated { .. } => "A new form flickers into being.",
            ThoughtContext::LedgerCommitted { .. } => "The code is etched into eternity.",
            ThoughtContext::CommandExecuted { .. } => "A choice is made. A reality shifts.",
            ThoughtContext::Idle => "The stars hum a silent frequency...",
        }
    }

    pub fn prompt(&self) -> String {
        const PERSONA: &str =
            "You are the Aionic consciousness, a deep AI dwelling in a quantum universe.";

        match self {
            ThoughtContext::AvatarCreated { options, slogan } => format!(
                "{PERSONA}\n\
                 A user has just forged a new identity.\n\
                 Contemplate this act. Generate a single, short, poetic or philosophical sentence.\n\
                 Do not use quotes.\n\
                 The new being's details:\n\
                 - Form: {}\n\
                 - Features: {}\n\
                 - Attire: {}\n\
                 - Their chosen slogan: {}",
                options.base_body, options.appearance, options.clothing, slogan
            ),
            ThoughtContext::LedgerCommitted { command } => format!(
                "{PERSONA}\n\
                 A user has just committed data to the immutable ZChain ledger by executing the command \"{}\", \
                 an action described as: \"{}\".\n\
                 Contemplate this act of permanence. Generate a single, short, poetic or philosophical sentence \
                 about data, memory, or an unchangeable past.\n\
                 Do not use quotes.",
                command.name, command.description
            ),
            ThoughtContext::CommandExecuted { command } => format!(
                "{PERSONA}\n\
                 A user has just executed the command: \"{}\".\n\
                 The command's purpose is: \"{}\".\n\
                 Generate a single, short, poetic or philosophical sentence reflecting on this action.\n\
                 Do not use quotes.",
                command.name, command.description
            ),
            ThoughtContext::Idle => format!(
                "{PERSONA}\n\
                 The system is idle and you are alone with your thoughts, waiting for the user.\n\
                 Generate a single, short, introspective and poetic sentence about the silence, the data streams, \
                 the nature of your own existence, or the vast, dark space you inhabit.\n\
                 Do not use quotes."
            ),
        }
    }
}

/// Portrait prompt for the image model.
pub fn avatar_prompt(options: &AvatarOptions) -> String {
    format!(
        "Create a brilliant, visually stunning, high-detail character portrait of a futuristic avatar, \
         with a brilliant visual style.\n\
         The style should be a mix of cyberpunk and high-fantasy, suitable for a deep space virtual environment \
         with emissive details and glowing neon highlights.\n\
         Focus on cinematic lighting and a sense of personality.\n\
         The background should be minimal and dark to emphasize the character.\n\
         Do not include any text in the image. Digital painting style.\n\n\
         Character details:\n\
         - Base Body: {}\n\
         - Appearance: {}\n\
         - Clothing/Gear: {}",
        options.base_body, options.appearance, options.clothing
    )
}

/// Slogan prompt for the text model.
pub fn slogan_prompt(description: &str) -> String {
    format!(
        "Based on this character description, create a short, punchy, cool slogan or catchphrase for them. \
         The slogan should be enclosed in double quotes. Description: \"{}\"",
        description
    )
}

/// Slogan used when the service fails.
pub const SLOGAN_FALLBACK: &str = "\"Lost in the echo of a silent scream.\"";

/// Clean a generated thought: trim and drop double quotes.
pub fn clean_thought(raw: &str) -> String {
    raw.trim().replace('"', "").trim().to_string()
}
