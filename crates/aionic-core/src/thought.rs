//! Ambient thought stream.
//!
//! A background loop that owns the displayed thought, the idle timer and
//! the display timer. `notify` cancels the idle timer and issues a new
//! generation request; requests it supersedes are aborted and their results
//! never applied. Once a result lands, the idle timer is re-armed, so an
//! idle thought only fires after a full interval without activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::genai::{Generator, ThoughtContext};

/// Thought shown when the universe starts.
pub const INITIAL_THOUGHT: &str = "Aionic consciousness online.";

/// The currently displayed commentary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientThought {
    pub text: String,
    pub visible: bool,
    /// Context that produced the thought; `None` for the initial one.
    pub context: Option<String>,
    /// Request sequence number that produced the thought.
    pub sequence: u64,
    pub updated_at: DateTime<Utc>,
}

impl AmbientThought {
    fn initial() -> Self {
        Self {
            text: INITIAL_THOUGHT.to_string(),
            visible: true,
            context: None,
            sequence: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Handle to the running thought loop.
pub struct ThoughtStream {
    requests: mpsc::UnboundedSender<ThoughtContext>,
    current: watch::Receiver<AmbientThought>,
    task: JoinHandle<()>,
}

impl ThoughtStream {
    /// Start the loop with the idle timer armed.
    pub fn spawn(generator: Generator, timing: &TimingConfig) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        let (current_tx, current) = watch::channel(AmbientThought::initial());

        let thought_loop = ThoughtLoop {
            generator,
            idle_after: timing.idle_thought(),
            display_for: timing.thought_display(),
            sequence: 0,
            idle_at: None,
            hide_at: None,
            pending: JoinSet::new(),
            current: current_tx,
        };
        let task = tokio::spawn(thought_loop.run(rx));

        Self {
            requests,
            current,
            task,
        }
    }

    /// Request a new thought for `context`.
    pub fn notify(&self, context: ThoughtContext) {
        debug!(context = context.as_str(), "Thought requested");
        if self.requests.send(context).is_err() {
            debug!("Thought loop has stopped");
        }
    }

    /// The thought on display right now.
    pub fn current(&self) -> AmbientThought {
        self.current.borrow().clone()
    }

    /// Watch for thought changes.
    pub fn subscribe(&self) -> watch::Receiver<AmbientThought> {
        self.current.clone()
    }

    /// Stop the loop and every request in flight.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for ThoughtStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ThoughtLoop {
    generator: Generator,
    idle_after: Duration,
    display_for: Duration,
    sequence: u64,
    idle_at: Option<Instant>,
    hide_at: Option<Instant>,
    pending: JoinSet<(u64, &'static str, String)>,
    current: watch::Sender<AmbientThought>,
}

impl ThoughtLoop {
    async fn run(mut self, mut requests: mpsc::UnboundedReceiver<ThoughtContext>) {
        let now = Instant::now();
        self.idle_at = Some(now + self.idle_after);
        self.hide_at = Some(now + self.display_for);

        loop {
            let idle_at = self.idle_at;
            let hide_at = self.hide_at;

            tokio::select! {
                request = requests.recv() => match request {
                    Some(context) => self.dispatch(context),
                    None => break,
                },
                Some(joined) = self.pending.join_next(), if !self.pending.is_empty() => {
                    // Aborted requests surface as join errors and are dropped.
                    if let Ok((sequence, context, text)) = joined {
                        self.apply(sequence, context, text);
                    }
                }
                _ = tokio::time::sleep_until(idle_at.unwrap_or_else(Instant::now)), if idle_at.is_some() => {
                    self.idle_at = None;
                    self.dispatch(ThoughtContext::Idle);
                }
                _ = tokio::time::sleep_until(hide_at.unwrap_or_else(Instant::now)), if hide_at.is_some() => {
                    self.hide_at = None;
                    self.current.send_modify(|thought| thought.visible = false);
                }
            }
        }

        self.pending.abort_all();
        debug!("Thought loop stopped");
    }

    fn dispatch(&mut self, context: ThoughtContext) {
        // Cancel the idle timer and anything this request supersedes.
        self.idle_at = None;
        self.pending.abort_all();

        self.sequence += 1;
        let sequence = self.sequence;
        let generator = self.generator.clone();

        debug!(context = context.as_str(), sequence, "Generating thought");
        self.pending.spawn(async move {
            let text = generator.thought(&context).await;
            (sequence, context.as_str(), text)
        });
    }

    fn apply(&mut self, sequence: u64, context: &'static str, text: String) {
        if sequence != self.sequence {
            debug!(sequence, latest = self.sequence, "Discarding stale thought");
            return;
        }

        info!(context, thought = %text, "Ambient thought");
        self.current.send_replace(AmbientThought {
            text,
            visible: true,
            context: Some(context.to_string()),
            sequence,
            updated_at: Utc::now(),
        });

        let now = Instant::now();
        self.hide_at = Some(now + self.display_for);
        self.idle_at = Some(now + self.idle_after);
    }
}
