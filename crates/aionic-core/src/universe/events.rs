//! Events broadcast by the coordinator.

use serde::{Deserialize, Serialize};

use super::state::PhaseTag;
use crate::avatar::AvatarState;
use crate::layout::{CameraPose, FocusTarget};

/// A visible change in the universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UniverseEvent {
    PhaseChanged {
        phase: PhaseTag,
        command_id: Option<String>,
    },
    /// The camera started moving. `pose` is `None` for unknown targets.
    CameraMoved {
        target: FocusTarget,
        pose: Option<CameraPose>,
        duration_ms: u64,
    },
    ImpactShake {
        duration_ms: u64,
        intensity: f32,
    },
    FocusArrived {
        target: FocusTarget,
    },
    /// The terminal was cleared down to a single line.
    OutputReset {
        line: String,
    },
    OutputAppended {
        line: String,
    },
    OutputVisibility {
        visible: bool,
    },
    LedgerCommitted {
        block: u64,
        command_id: String,
    },
    PanelToggled {
        visible: bool,
    },
    AvatarChanged {
        avatar: AvatarState,
    },
}

impl UniverseEvent {
    /// Short name for logs and the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            UniverseEvent::PhaseChanged { .. } => "phase_changed",
            UniverseEvent::CameraMoved { .. } => "camera_moved",
            UniverseEvent::ImpactShake { .. } => "impact_shake",
            UniverseEvent::FocusArrived { .. } => "focus_arrived",
            UniverseEvent::OutputReset { .. } => "output_reset",
            UniverseEvent::OutputAppended { .. } => "output_appended",
            UniverseEvent::OutputVisibility { .. } => "output_visibility",
            UniverseEvent::LedgerCommitted { .. } => "ledger_committed",
            UniverseEvent::PanelToggled { .. } => "panel_toggled",
            UniverseEvent::AvatarChanged { .. } => "avatar_changed",
        }
    }
}
