//! Script playback.
//!
//! [`ScriptPlayer`] paces a command's script in a spawned task and reports
//! each step over a channel. [`ExecutionSession`] applies those steps to
//! the output buffer and the ledger on the coordinator's side, so all state
//! changes stay with a single owner.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Command;
use crate::config::TimingConfig;
use crate::output::{commit_line, Ledger, OutputBuffer, BLANK_LINE, COMPLETION_LINE};

/// One paced step of a playback run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStep {
    /// Reveal script line `index`.
    Line { index: usize, text: String },
    /// Commit the command to the ledger.
    Commit,
    /// Write the completion line and end the session.
    Complete,
}

/// A step tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackUpdate {
    pub session_id: Uuid,
    pub step: PlaybackStep,
}

/// Paces script lines, the ledger commit and the completion step.
#[derive(Debug, Clone, Copy)]
pub struct ScriptPlayer {
    line_delay: Duration,
    commit_delay: Duration,
    completion_delay: Duration,
}

impl ScriptPlayer {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            line_delay: timing.line_delay(),
            commit_delay: timing.commit_delay(),
            completion_delay: timing.completion_delay(),
        }
    }

    /// Run the playback, sending one update per step.
    ///
    /// Stops early if the receiver is gone.
    pub async fn play(
        self,
        session_id: Uuid,
        command: Arc<Command>,
        updates: mpsc::UnboundedSender<PlaybackUpdate>,
    ) {
        info!(session = %session_id, command = %command.name, "Playback started");

        let send = |step: PlaybackStep| updates.send(PlaybackUpdate { session_id, step }).is_ok();

        for (index, text) in command.script.iter().enumerate() {
            tokio::time::sleep(self.line_delay).await;
            if !send(PlaybackStep::Line {
                index,
                text: text.clone(),
            }) {
                debug!(session = %session_id, "Playback receiver closed");
                return;
            }
        }

        if command.ledger_committing {
            tokio::time::sleep(self.commit_delay).await;
            if !send(PlaybackStep::Commit) {
                return;
            }
        }

        tokio::time::sleep(self.completion_delay).await;
        send(PlaybackStep::Complete);
    }

    /// Spawn [`play`](Self::play) onto the runtime.
    pub fn spawn(
        self,
        session_id: Uuid,
        command: Arc<Command>,
        updates: mpsc::UnboundedSender<PlaybackUpdate>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.play(session_id, command, updates))
    }
}

/// Progress of an execution session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Playing,
    Committed { block: u64 },
    Complete,
}

/// What applying a step changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEffect {
    Appended(Vec<String>),
    Committed { block: u64, lines: Vec<String> },
    Completed(Vec<String>),
    /// Out-of-order or duplicate step; nothing changed.
    Ignored,
}

/// The single live playback of a command.
#[derive(Debug, Clone)]
pub struct ExecutionSession {
    pub id: Uuid,
    pub command: Arc<Command>,
    /// Number of script lines revealed so far.
    pub cursor: usize,
    pub phase: SessionPhase,
}

impl ExecutionSession {
    pub fn new(command: Arc<Command>) -> Self {
        Self {
            id: Uuid::new_v4(),
            command,
            cursor: 0,
            phase: SessionPhase::Playing,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Apply a step to the terminal and ledger.
    ///
    /// Lines must arrive in script order, a commit happens at most once and
    /// only for committing commands, and nothing applies after completion.
    pub fn apply(
        &mut self,
        step: PlaybackStep,
        output: &mut OutputBuffer,
        ledger: &mut Ledger,
    ) -> StepEffect {
        match (step, self.phase) {
            (PlaybackStep::Line { index, text }, SessionPhase::Playing) if index == self.cursor => {
                self.cursor += 1;
                output.push(text.clone());
                StepEffect::Appended(vec![text])
            }
            (PlaybackStep::Commit, SessionPhase::Playing)
                if self.command.ledger_committing && self.cursor == self.command.script.len() =>
            {
                let block = ledger.commit();
                let lines = vec![BLANK_LINE.to_string(), commit_line(block)];
                for line in &lines {
                    output.push(line.clone());
                }
                self.phase = SessionPhase::Committed { block };
                info!(session = %self.id, command = %self.command.name, block, "Ledger commit");
                StepEffect::Committed { block, lines }
            }
            (PlaybackStep::Complete, SessionPhase::Playing | SessionPhase::Committed { .. })
                if self.cursor == self.command.script.len()
                    && (!self.command.ledger_committing
                        || matches!(self.phase, SessionPhase::Committed { .. })) =>
            {
                let lines = vec![BLANK_LINE.to_string(), COMPLETION_LINE.to_string()];
                for line in &lines {
                    output.push(line.clone());
                }
                self.phase = SessionPhase::Complete;
                info!(session = %self.id, command = %self.command.name, "Playback complete");
                StepEffect::Completed(lines)
            }
            (step, phase) => {
                debug!(session = %self.id, ?step, ?phase, "Ignoring out-of-order playback step");
                StepEffect::Ignored
            }
        }
    }
}
