//! Application state owned by the coordinator task.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::avatar::AvatarState;
use crate::catalog::Command;
use crate::focus::FocusTicket;
use crate::output::{Ledger, OutputBuffer, AWAITING_LINE};
use crate::script::ExecutionSession;
use crate::thought::AmbientThought;

/// Where the coordinator is in a command execution.
#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    /// Camera is moving to the selected command's glyph.
    Focusing {
        command: Arc<Command>,
        ticket: FocusTicket,
    },
    Playing(ExecutionSession),
    /// Output stays up until the cooldown expires.
    Cooldown { command: Arc<Command> },
}

impl Phase {
    pub fn tag(&self) -> PhaseTag {
        match self {
            Phase::Idle => PhaseTag::Idle,
            Phase::Focusing { .. } => PhaseTag::Focusing,
            Phase::Playing(_) => PhaseTag::Playing,
            Phase::Cooldown { .. } => PhaseTag::Cooldown,
        }
    }

    /// The command being executed, if any.
    pub fn command(&self) -> Option<&Arc<Command>> {
        match self {
            Phase::Idle => None,
            Phase::Focusing { command, .. } | Phase::Cooldown { command } => Some(command),
            Phase::Playing(session) => Some(&session.command),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }
}

/// Serializable phase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTag {
    Idle,
    Focusing,
    Playing,
    Cooldown,
}

impl PhaseTag {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseTag::Idle => "idle",
            PhaseTag::Focusing => "focusing",
            PhaseTag::Playing => "playing",
            PhaseTag::Cooldown => "cooldown",
        }
    }
}

/// Everything the coordinator mutates.
#[derive(Debug, Clone)]
pub struct AppState {
    pub phase: Phase,
    pub output: OutputBuffer,
    pub output_visible: bool,
    pub ledger: Ledger,
    pub panel_visible: bool,
    pub avatar: AvatarState,
}

impl AppState {
    pub fn new(output_capacity: usize, ledger: Ledger) -> Self {
        let mut output = OutputBuffer::new(output_capacity);
        output.push(AWAITING_LINE);

        Self {
            phase: Phase::Idle,
            output,
            output_visible: false,
            ledger,
            panel_visible: false,
            avatar: AvatarState::default(),
        }
    }

    pub fn snapshot(&self, thought: AmbientThought) -> UniverseSnapshot {
        UniverseSnapshot {
            phase: self.phase.tag(),
            active_command: self.phase.command().map(|c| c.id.clone()),
            output: self.output.to_vec(),
            output_visible: self.output_visible,
            block: self.ledger.block(),
            panel_visible: self.panel_visible,
            avatar: self.avatar.clone(),
            thought,
        }
    }
}

/// Read-only copy of the state for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    pub phase: PhaseTag,
    pub active_command: Option<String>,
    pub output: Vec<String>,
    pub output_visible: bool,
    pub block: u64,
    pub panel_visible: bool,
    pub avatar: AvatarState,
    pub thought: AmbientThought,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_new_state_is_idle_and_awaiting() {
        let state = AppState::new(20, Ledger::default());
        assert!(state.phase.is_idle());
        assert_eq!(state.output.to_vec(), vec![AWAITING_LINE]);
        assert!(!state.output_visible);
        assert_eq!(state.ledger.block(), 0);
    }

    #[test]
    fn test_phase_exposes_active_command() {
        let command = Catalog::builtin().get("1").unwrap().clone();
        let phase = Phase::Cooldown {
            command: command.clone(),
        };
        assert_eq!(phase.tag(), PhaseTag::Cooldown);
        assert_eq!(phase.command().map(|c| c.id.as_str()), Some("1"));
        assert!(Phase::Idle.command().is_none());
    }
}
