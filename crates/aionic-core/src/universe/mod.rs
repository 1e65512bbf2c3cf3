//! The universe coordinator.
//!
//! A single task owns [`AppState`] and drives each command through
//!
//! ```text
//! IDLE --select--> FOCUSING --arrived--> PLAYING --completed--> COOLDOWN --timeout--> IDLE
//! ```
//!
//! Callers talk to it through a cloneable [`UniverseHandle`]. Focus timers,
//! script playback and avatar generation run in spawned tasks and report
//! back over channels, so state is only ever touched inside the loop.

mod events;
mod state;

pub use events::UniverseEvent;
pub use state::{AppState, Phase, PhaseTag, UniverseSnapshot};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::avatar::{self, CreatedAvatar};
use crate::catalog::{Catalog, Command};
use crate::config::UniverseConfig;
use crate::error::{Error, GenerationError, Result};
use crate::focus::{FocusController, FocusRequest, FocusSignal};
use crate::genai::{service_from_config, AvatarOptions, GenerativeService, Generator, ThoughtContext};
use crate::layout::{FocusTarget, Layout};
use crate::output::Ledger;
use crate::script::{ExecutionSession, PlaybackUpdate, ScriptPlayer, StepEffect};
use crate::thought::{AmbientThought, ThoughtStream};

const REQUEST_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

/// Answer to a `select` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectOutcome {
    /// The command is now focusing.
    Accepted { command_id: String },
    /// Another command is in progress; nothing changed.
    Rejected { phase: PhaseTag },
}

impl SelectOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SelectOutcome::Accepted { .. })
    }
}

enum Request {
    Select {
        key: String,
        reply: oneshot::Sender<Result<SelectOutcome>>,
    },
    Focus {
        target: FocusTarget,
        reply: oneshot::Sender<bool>,
    },
    CreateAvatar {
        options: AvatarOptions,
        reply: oneshot::Sender<u64>,
    },
    ClosePanel,
    Snapshot {
        reply: oneshot::Sender<UniverseSnapshot>,
    },
    Shutdown,
}

/// Builder for a universe instance.
pub struct Universe {
    config: UniverseConfig,
    catalog: Catalog,
    service: Arc<dyn GenerativeService>,
    ledger: Ledger,
}

impl Universe {
    /// Universe with the built-in catalog and a fresh ledger.
    pub fn new(config: UniverseConfig, service: Arc<dyn GenerativeService>) -> Self {
        Self {
            config,
            catalog: Catalog::builtin(),
            service,
            ledger: Ledger::default(),
        }
    }

    /// Universe whose generation service is picked from the config.
    pub fn from_config(config: UniverseConfig) -> Result<Self> {
        config.validate()?;
        let service = service_from_config(&config.generation)?;
        Ok(Self::new(config, service))
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Spawn the coordinator. Must be called from within a tokio runtime.
    pub fn start(self) -> (UniverseHandle, JoinHandle<()>) {
        let Universe {
            config,
            catalog,
            service,
            ledger,
        } = self;

        let catalog = Arc::new(catalog);
        let generator = Generator::new(service, config.generation.request_timeout());
        let thoughts = ThoughtStream::spawn(generator.clone(), &config.timing);
        let (focus, focus_rx) =
            FocusController::new(catalog.clone(), Layout::new(config.viewport), &config.timing);

        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_BUFFER);
        let (playback_tx, playback_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let handle = UniverseHandle {
            requests: requests_tx,
            events: events.clone(),
            thoughts: thoughts.subscribe(),
            catalog: catalog.clone(),
        };

        let coordinator = Coordinator {
            catalog,
            state: AppState::new(config.output.capacity, ledger),
            focus,
            player: ScriptPlayer::new(&config.timing),
            thoughts,
            generator,
            cooldown: config.timing.cooldown(),
            cooldown_at: None,
            playback_tx,
            playback_task: None,
            avatar_jobs: JoinSet::new(),
            events,
        };

        info!(
            commands = coordinator.catalog.len(),
            block = coordinator.state.ledger.block(),
            viewport = ?config.viewport,
            "Universe started"
        );
        let task = tokio::spawn(coordinator.run(requests_rx, focus_rx, playback_rx));

        (handle, task)
    }
}

/// Cloneable handle to a running universe.
#[derive(Clone)]
pub struct UniverseHandle {
    requests: mpsc::Sender<Request>,
    events: broadcast::Sender<UniverseEvent>,
    thoughts: watch::Receiver<AmbientThought>,
    catalog: Arc<Catalog>,
}

impl UniverseHandle {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Select a command by id or name.
    pub async fn select(&self, key: impl Into<String>) -> Result<SelectOutcome> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Select {
                key: key.into(),
                reply,
            })
            .await?;
        rx.await?
    }

    /// Move the camera freely. Ignored unless the universe is idle.
    pub async fn focus(&self, target: FocusTarget) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.requests.send(Request::Focus { target, reply }).await?;
        Ok(rx.await?)
    }

    /// Start an avatar generation and return its sequence number.
    pub async fn create_avatar(&self, options: AvatarOptions) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::CreateAvatar { options, reply })
            .await?;
        Ok(rx.await?)
    }

    pub async fn close_panel(&self) -> Result<()> {
        self.requests.send(Request::ClosePanel).await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<UniverseSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.requests.send(Request::Snapshot { reply }).await?;
        Ok(rx.await?)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UniverseEvent> {
        self.events.subscribe()
    }

    /// Watch the ambient thought.
    pub fn thoughts(&self) -> watch::Receiver<AmbientThought> {
        self.thoughts.clone()
    }

    /// Wait until no command is in progress.
    pub async fn wait_until_idle(&self) -> Result<UniverseSnapshot> {
        self.wait_for(
            |snapshot| snapshot.phase == PhaseTag::Idle,
            |event| {
                matches!(
                    event,
                    UniverseEvent::PhaseChanged {
                        phase: PhaseTag::Idle,
                        ..
                    }
                )
            },
        )
        .await
    }

    /// Wait until the avatar request in flight has finished.
    pub async fn wait_for_avatar(&self) -> Result<UniverseSnapshot> {
        self.wait_for(
            |snapshot| !snapshot.avatar.loading,
            |event| matches!(event, UniverseEvent::AvatarChanged { avatar } if !avatar.loading),
        )
        .await
    }

    async fn wait_for(
        &self,
        done: impl Fn(&UniverseSnapshot) -> bool,
        signal: impl Fn(&UniverseEvent) -> bool,
    ) -> Result<UniverseSnapshot> {
        // Subscribe before looking, so a change between the two is not missed.
        let mut events = self.subscribe();
        let snapshot = self.snapshot().await?;
        if done(&snapshot) {
            return Ok(snapshot);
        }

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) if signal(&event) => return self.snapshot().await,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Event subscriber lagged");
                        let snapshot = self.snapshot().await?;
                        if done(&snapshot) {
                            return Ok(snapshot);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return Err(Error::ChannelClosed),
                },
                _ = self.requests.closed() => return Err(Error::ChannelClosed),
            }
        }
    }

    /// Stop the coordinator and every timer it owns.
    pub async fn shutdown(&self) -> Result<()> {
        self.requests.send(Request::Shutdown).await?;
        Ok(())
    }
}

type AvatarJob = (u64, AvatarOptions, std::result::Result<CreatedAvatar, GenerationError>);

struct Coordinator {
    catalog: Arc<Catalog>,
    state: AppState,
    focus: FocusController,
    player: ScriptPlayer,
    thoughts: ThoughtStream,
    generator: Generator,
    cooldown: Duration,
    cooldown_at: Option<Instant>,
    playback_tx: mpsc::UnboundedSender<PlaybackUpdate>,
    playback_task: Option<JoinHandle<()>>,
    avatar_jobs: JoinSet<AvatarJob>,
    events: broadcast::Sender<UniverseEvent>,
}

impl Coordinator {
    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut focus_signals: mpsc::UnboundedReceiver<FocusSignal>,
        mut playback: mpsc::UnboundedReceiver<PlaybackUpdate>,
    ) {
        loop {
            let cooldown_at = self.cooldown_at;

            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => self.handle(request),
                },
                Some(signal) = focus_signals.recv() => self.on_focus_signal(signal),
                Some(update) = playback.recv() => self.on_playback(update),
                Some(joined) = self.avatar_jobs.join_next(), if !self.avatar_jobs.is_empty() => {
                    // Aborted jobs were superseded and are dropped.
                    if let Ok((sequence, options, outcome)) = joined {
                        self.on_avatar_finished(sequence, options, outcome);
                    }
                }
                _ = tokio::time::sleep_until(cooldown_at.unwrap_or_else(Instant::now)), if cooldown_at.is_some() => {
                    self.on_cooldown_elapsed();
                }
            }
        }

        self.stop();
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Select { key, reply } => {
                let _ = reply.send(self.select(&key));
            }
            Request::Focus { target, reply } => {
                let _ = reply.send(self.free_focus(target));
            }
            Request::CreateAvatar { options, reply } => {
                let _ = reply.send(self.create_avatar(options));
            }
            Request::ClosePanel => {
                if self.state.panel_visible {
                    self.state.panel_visible = false;
                    self.emit(UniverseEvent::PanelToggled { visible: false });
                }
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot(self.thoughts.current()));
            }
            Request::Shutdown => {}
        }
    }

    fn emit(&self, event: UniverseEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        let event = UniverseEvent::PhaseChanged {
            phase: self.state.phase.tag(),
            command_id: self.state.phase.command().map(|c| c.id.clone()),
        };
        debug!(phase = self.state.phase.tag().as_str(), "Phase changed");
        self.emit(event);
    }

    fn move_camera(&mut self, target: FocusTarget) -> FocusRequest {
        let request = self.focus.request_focus(target);
        self.emit(UniverseEvent::CameraMoved {
            target: request.target.clone(),
            pose: request.pose,
            duration_ms: request.duration.as_millis() as u64,
        });
        request
    }

    fn select(&mut self, key: &str) -> Result<SelectOutcome> {
        let command = self
            .catalog
            .resolve(key)
            .cloned()
            .ok_or_else(|| Error::unknown_command(key))?;

        if !self.state.phase.is_idle() {
            let phase = self.state.phase.tag();
            info!(command = %command.name, phase = phase.as_str(), "Command rejected, universe busy");
            return Ok(SelectOutcome::Rejected { phase });
        }

        info!(command = %command.name, id = %command.id, "Command selected");

        if command.is_toggle_panel() {
            self.state.panel_visible = !self.state.panel_visible;
            self.emit(UniverseEvent::PanelToggled {
                visible: self.state.panel_visible,
            });
        } else {
            let start = command.start_line();
            self.state.output.reset(start.clone());
            self.state.output_visible = true;
            self.emit(UniverseEvent::OutputReset { line: start });
            self.emit(UniverseEvent::OutputVisibility { visible: true });
        }

        let request = self.move_camera(FocusTarget::Command(command.id.clone()));
        let command_id = command.id.clone();
        self.set_phase(Phase::Focusing {
            command,
            ticket: request.ticket,
        });

        Ok(SelectOutcome::Accepted { command_id })
    }

    fn free_focus(&mut self, target: FocusTarget) -> bool {
        if !self.state.phase.is_idle() {
            debug!(target = %target, "Ignoring focus request while busy");
            return false;
        }
        self.move_camera(target);
        true
    }

    fn on_focus_signal(&mut self, signal: FocusSignal) {
        match signal {
            FocusSignal::ImpactShake {
                ticket,
                duration,
                intensity,
            } => {
                if self.focus.is_current(ticket) {
                    self.emit(UniverseEvent::ImpactShake {
                        duration_ms: duration.as_millis() as u64,
                        intensity,
                    });
                }
            }
            FocusSignal::Arrived(arrival) => {
                if !self.focus.accept(&arrival) {
                    return;
                }
                self.emit(UniverseEvent::FocusArrived {
                    target: arrival.target.clone(),
                });

                let command = match &self.state.phase {
                    Phase::Focusing { command, ticket }
                        if *ticket == arrival.ticket
                            && arrival.target.command_id() == Some(command.id.as_str()) =>
                    {
                        command.clone()
                    }
                    _ => return,
                };

                if command.is_toggle_panel() {
                    self.set_phase(Phase::Idle);
                } else {
                    self.start_playback(command);
                }
            }
        }
    }

    fn start_playback(&mut self, command: Arc<Command>) {
        let session = ExecutionSession::new(command.clone());

        self.move_camera(FocusTarget::OutputConsole);
        self.thoughts.notify(ThoughtContext::CommandExecuted {
            command: command.clone(),
        });
        self.playback_task = Some(self.player.spawn(
            session.id,
            command,
            self.playback_tx.clone(),
        ));
        self.set_phase(Phase::Playing(session));
    }

    fn on_playback(&mut self, update: PlaybackUpdate) {
        let (effect, command) = {
            let Phase::Playing(session) = &mut self.state.phase else {
                debug!(session = %update.session_id, "Playback update outside of playback");
                return;
            };
            if session.id != update.session_id {
                debug!(session = %update.session_id, "Playback update for a finished session");
                return;
            }
            let effect = session.apply(update.step, &mut self.state.output, &mut self.state.ledger);
            (effect, session.command.clone())
        };

        match effect {
            StepEffect::Appended(lines) => self.emit_lines(lines),
            StepEffect::Committed { block, lines } => {
                self.emit_lines(lines);
                self.emit(UniverseEvent::LedgerCommitted {
                    block,
                    command_id: command.id.clone(),
                });
                self.thoughts
                    .notify(ThoughtContext::LedgerCommitted { command });
            }
            StepEffect::Completed(lines) => {
                self.emit_lines(lines);
                self.playback_task = None;
                self.cooldown_at = Some(Instant::now() + self.cooldown);
                self.set_phase(Phase::Cooldown { command });
            }
            StepEffect::Ignored => {}
        }
    }

    fn emit_lines(&self, lines: Vec<String>) {
        for line in lines {
            self.emit(UniverseEvent::OutputAppended { line });
        }
    }

    fn on_cooldown_elapsed(&mut self) {
        self.cooldown_at = None;
        if !matches!(self.state.phase, Phase::Cooldown { .. }) {
            return;
        }

        self.state.output_visible = false;
        self.emit(UniverseEvent::OutputVisibility { visible: false });
        self.set_phase(Phase::Idle);
    }

    fn create_avatar(&mut self, options: AvatarOptions) -> u64 {
        // Only the latest request can land.
        self.avatar_jobs.abort_all();
        let sequence = self.state.avatar.begin();
        info!(sequence, description = %options.description(), "Creating avatar");
        self.emit(UniverseEvent::AvatarChanged {
            avatar: self.state.avatar.clone(),
        });

        if self.state.phase.is_idle() {
            self.move_camera(FocusTarget::Avatar);
        }

        let generator = self.generator.clone();
        self.avatar_jobs.spawn(async move {
            let outcome = avatar::create(&generator, &options).await;
            (sequence, options, outcome)
        });

        sequence
    }

    fn on_avatar_finished(
        &mut self,
        sequence: u64,
        options: AvatarOptions,
        outcome: std::result::Result<CreatedAvatar, GenerationError>,
    ) {
        if let Some(context) = self.state.avatar.finish(sequence, options, outcome) {
            self.thoughts.notify(context);
        }
        self.emit(UniverseEvent::AvatarChanged {
            avatar: self.state.avatar.clone(),
        });
    }

    fn stop(&mut self) {
        self.focus.cancel();
        if let Some(task) = self.playback_task.take() {
            task.abort();
        }
        self.avatar_jobs.abort_all();
        self.thoughts.shutdown();
        info!("Universe stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::testing::ScriptedService;
    use crate::output::{AWAITING_LINE, COMPLETION_LINE};
    use tokio::time::sleep;

    fn start(service: ScriptedService) -> (UniverseHandle, JoinHandle<()>) {
        Universe::new(UniverseConfig::default(), Arc::new(service)).start()
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle() {
        let (universe, _task) = start(ScriptedService::default());
        let snapshot = universe.snapshot().await.unwrap();

        assert_eq!(snapshot.phase, PhaseTag::Idle);
        assert_eq!(snapshot.output, vec![AWAITING_LINE]);
        assert!(!snapshot.output_visible);
        assert_eq!(snapshot.thought.text, crate::thought::INITIAL_THOUGHT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_command_is_an_error() {
        let (universe, _task) = start(ScriptedService::default());
        let result = universe.select("QUANTUM").await;
        assert!(matches!(result, Err(Error::UnknownCommand(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_phases_follow_timers() {
        let (universe, _task) = start(ScriptedService::default());

        // MANIFEST: three lines, no ledger.
        let outcome = universe.select("MANIFEST").await.unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(universe.snapshot().await.unwrap().phase, PhaseTag::Focusing);

        // Move plus shake.
        sleep(Duration::from_millis(1_310)).await;
        assert_eq!(universe.snapshot().await.unwrap().phase, PhaseTag::Playing);

        // 3 x 500 ms lines then 600 ms completion.
        sleep(Duration::from_millis(2_100)).await;
        let snapshot = universe.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, PhaseTag::Cooldown);
        assert_eq!(snapshot.output.last().map(String::as_str), Some(COMPLETION_LINE));
        assert!(snapshot.output_visible);

        sleep(Duration::from_millis(3_000)).await;
        let snapshot = universe.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, PhaseTag::Idle);
        assert!(!snapshot.output_visible);
        assert!(snapshot.active_command.is_none());
    }

    #[test]
    fn test_from_config_rejects_invalid_settings() {
        let mut config = UniverseConfig::default();
        config.output.capacity = 0;
        assert!(matches!(Universe::from_config(config), Err(Error::Config(_))));
        assert!(Universe::from_config(UniverseConfig::default()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_focus_only_when_idle() {
        let (universe, _task) = start(ScriptedService::default());
        assert!(universe.focus(FocusTarget::Avatar).await.unwrap());

        universe.select("2").await.unwrap();
        assert!(!universe.focus(FocusTarget::OutputConsole).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let (universe, task) = start(ScriptedService::default());
        universe.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(matches!(universe.snapshot().await, Err(Error::ChannelClosed)));
    }
}
