//! Terminal rendering of universe events and thoughts.

use aionic_core::layout::CameraPose;
use aionic_core::thought::AmbientThought;
use aionic_core::{UniverseEvent, UniverseHandle};
use colored::Colorize;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

/// Background task printing events and visible thoughts.
pub struct Printer {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Printer {
    /// Print every event already emitted, then stop.
    pub async fn finish(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}

pub fn spawn_printer(universe: &UniverseHandle) -> Printer {
    let mut events = universe.subscribe();
    let mut thoughts = universe.thoughts();
    let (stop, mut stopped) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut stopped => {
                    for line in drain_pending(&mut events) {
                        println!("{}", line);
                    }
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Some(line) = format_event(&event) {
                            println!("{}", line);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => println!("{}", skipped_line(skipped)),
                    Err(RecvError::Closed) => break,
                },
                changed = thoughts.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let thought = thoughts.borrow_and_update().clone();
                    if thought.visible {
                        println!("{}", format_thought(&thought));
                    }
                }
            }
        }
    });

    Printer { stop, task }
}

/// Display lines for events still buffered in `events`.
pub fn drain_pending(events: &mut broadcast::Receiver<UniverseEvent>) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => lines.extend(format_event(&event)),
            Err(TryRecvError::Lagged(skipped)) => lines.push(skipped_line(skipped)),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    lines
}

fn skipped_line(skipped: u64) -> String {
    format!("  ({} events skipped)", skipped).dimmed().to_string()
}

/// One display line for an event, or `None` for events not worth printing.
pub fn format_event(event: &UniverseEvent) -> Option<String> {
    let line = match event {
        UniverseEvent::OutputReset { line } | UniverseEvent::OutputAppended { line } => {
            format_output_line(line)
        }
        UniverseEvent::CameraMoved {
            target,
            pose,
            duration_ms,
        } => match pose {
            Some(pose) => format!(
                "  camera → {} {} over {}ms",
                target,
                format_pose(pose),
                duration_ms
            )
            .blue()
            .to_string(),
            None => format!("  camera → {} (no position)", target)
                .blue()
                .to_string(),
        },
        UniverseEvent::ImpactShake {
            duration_ms,
            intensity,
        } => format!("  ~ impact shake {}ms @ {:.2}", duration_ms, intensity)
            .magenta()
            .to_string(),
        UniverseEvent::PhaseChanged { phase, command_id } => {
            let command = command_id
                .as_deref()
                .map(|id| format!(" [{}]", id))
                .unwrap_or_default();
            format!("  · {}{}", phase.as_str(), command)
                .dimmed()
                .to_string()
        }
        UniverseEvent::PanelToggled { visible } => {
            let state = if *visible { "open" } else { "closed" };
            format!("  harmony panel {}", state).cyan().to_string()
        }
        UniverseEvent::AvatarChanged { avatar } if !avatar.loading => match &avatar.error {
            Some(error) => error.red().to_string(),
            None => format!(
                "  avatar ready: {}",
                avatar.slogan.as_deref().unwrap_or_default()
            )
            .cyan()
            .to_string(),
        },
        UniverseEvent::AvatarChanged { .. } => "  avatar: generating...".dimmed().to_string(),
        UniverseEvent::FocusArrived { .. }
        | UniverseEvent::OutputVisibility { .. }
        | UniverseEvent::LedgerCommitted { .. } => return None,
    };
    Some(line)
}

/// Color a terminal line by its prefix.
pub fn format_output_line(line: &str) -> String {
    if line.starts_with("ZCHAIN_LOG") {
        line.yellow().bold().to_string()
    } else if line.starts_with('>') {
        line.green().to_string()
    } else {
        line.to_string()
    }
}

pub fn format_thought(thought: &AmbientThought) -> String {
    format!(
        "  ✦ {} {}",
        thought.updated_at.format("%H:%M:%S"),
        thought.text
    )
    .italic()
    .purple()
    .to_string()
}

fn format_pose(pose: &CameraPose) -> String {
    let p = pose.position;
    format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
}
