//! End-to-end command and avatar flows against a stub generative service.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_test::assert_ok;

use aionic_core::avatar::{DEFAULT_AVATAR, ERROR_SLOGAN};
use aionic_core::catalog::{Catalog, Command, Glyph};
use aionic_core::genai::GeneratedImage;
use aionic_core::output::{Ledger, AWAITING_LINE, COMPLETION_LINE};
use aionic_core::{
    AvatarOptions, GenerationError, GenerativeService, PhaseTag, SelectOutcome, Universe,
    UniverseConfig, UniverseEvent, UniverseHandle,
};

struct StubService {
    text: Option<String>,
    image: Option<GeneratedImage>,
}

#[async_trait]
impl GenerativeService for StubService {
    async fn generate_text(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.text.clone().ok_or(GenerationError::NotConfigured)
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, GenerationError> {
        self.image.clone().ok_or(GenerationError::Empty("an image"))
    }
}

fn offline() -> Arc<StubService> {
    Arc::new(StubService {
        text: None,
        image: None,
    })
}

fn catalog() -> Catalog {
    Catalog::new(vec![
        Command::script("a", "ALPHA", "Two quiet lines.", Glyph::Nexus, &["a", "b"]),
        Command::script("x", "XI", "One line, then a block.", Glyph::Serpent, &["x"]).committing(),
    ])
    .unwrap()
}

fn start(ledger: Ledger) -> UniverseHandle {
    let (handle, _task) = Universe::new(UniverseConfig::default(), offline())
        .with_catalog(catalog())
        .with_ledger(ledger)
        .start();
    handle
}

fn drain(events: &mut broadcast::Receiver<UniverseEvent>) -> Vec<UniverseEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn phases(events: &[UniverseEvent]) -> Vec<PhaseTag> {
    events
        .iter()
        .filter_map(|event| match event {
            UniverseEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_plain_command_runs_to_idle() {
    let universe = start(Ledger::default());
    let mut events = universe.subscribe();

    let outcome = assert_ok!(universe.select("ALPHA").await);
    assert_eq!(
        outcome,
        SelectOutcome::Accepted {
            command_id: "a".to_string()
        }
    );

    let snapshot = assert_ok!(universe.wait_until_idle().await);
    assert_eq!(
        snapshot.output,
        vec![
            "> EXECUTING ALPHA...",
            "a",
            "b",
            " ",
            COMPLETION_LINE,
        ]
    );
    assert_eq!(snapshot.block, 0);
    assert!(!snapshot.output_visible);
    assert!(snapshot.active_command.is_none());

    let seen = drain(&mut events);
    assert_eq!(
        phases(&seen),
        vec![
            PhaseTag::Focusing,
            PhaseTag::Playing,
            PhaseTag::Cooldown,
            PhaseTag::Idle,
        ]
    );
    assert!(seen
        .iter()
        .any(|e| matches!(e, UniverseEvent::ImpactShake { .. })));
    assert!(!seen
        .iter()
        .any(|e| matches!(e, UniverseEvent::LedgerCommitted { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_committing_command_advances_ledger_once() {
    let universe = start(Ledger::at(2));
    let mut events = universe.subscribe();

    assert_ok!(universe.select("x").await);
    let snapshot = assert_ok!(universe.wait_until_idle().await);

    assert_eq!(snapshot.block, 3);
    let commits: Vec<_> = snapshot
        .output
        .iter()
        .filter(|line| line.starts_with("ZCHAIN_LOG"))
        .collect();
    assert_eq!(commits, vec!["ZCHAIN_LOG: Data committed to block #3."]);

    let committed: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            UniverseEvent::LedgerCommitted { block, command_id } => Some((block, command_id)),
            _ => None,
        })
        .collect();
    assert_eq!(committed, vec![(3, "x".to_string())]);

    // The commit thought was requested after the execution thought.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let thought = universe.thoughts().borrow().clone();
    assert_eq!(thought.context.as_deref(), Some("ledger_committed"));
    assert_eq!(thought.text, "The code is etched into eternity.");
}

#[tokio::test(start_paused = true)]
async fn test_select_while_busy_changes_nothing() {
    let universe = start(Ledger::at(7));

    assert_ok!(universe.select("ALPHA").await);
    let before = assert_ok!(universe.snapshot().await);
    assert_eq!(before.phase, PhaseTag::Focusing);

    let mut events = universe.subscribe();
    let outcome = assert_ok!(universe.select("XI").await);
    assert_eq!(
        outcome,
        SelectOutcome::Rejected {
            phase: PhaseTag::Focusing
        }
    );
    assert_eq!(assert_ok!(universe.snapshot().await), before);
    assert!(drain(&mut events).is_empty());

    // Still rejected mid-playback, and the first command finishes untouched.
    tokio::time::sleep(Duration::from_millis(1_600)).await;
    let outcome = assert_ok!(universe.select("XI").await);
    assert_eq!(
        outcome,
        SelectOutcome::Rejected {
            phase: PhaseTag::Playing
        }
    );

    // Two lines and the completion land at 2.91 s; cooldown runs 3 s after that.
    tokio::time::sleep(Duration::from_millis(1_400)).await;
    let cooling = assert_ok!(universe.snapshot().await);
    assert_eq!(cooling.phase, PhaseTag::Cooldown);

    let mut events = universe.subscribe();
    let outcome = assert_ok!(universe.select("XI").await);
    assert_eq!(
        outcome,
        SelectOutcome::Rejected {
            phase: PhaseTag::Cooldown
        }
    );
    assert_eq!(assert_ok!(universe.snapshot().await), cooling);
    assert!(drain(&mut events).is_empty());

    let snapshot = assert_ok!(universe.wait_until_idle().await);
    assert_eq!(snapshot.block, 7);
    assert_eq!(snapshot.output.first().map(String::as_str), Some("> EXECUTING ALPHA..."));
    assert!(!snapshot.output.iter().any(|line| line.starts_with("ZCHAIN_LOG")));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_command_leaves_universe_idle() {
    let universe = start(Ledger::default());

    assert!(universe.select("ZETA").await.is_err());
    let snapshot = assert_ok!(universe.snapshot().await);
    assert_eq!(snapshot.phase, PhaseTag::Idle);
    assert_eq!(snapshot.output, vec![AWAITING_LINE]);
}

#[tokio::test(start_paused = true)]
async fn test_harmony_toggles_panel_without_playback() {
    let (universe, _task) = Universe::new(UniverseConfig::default(), offline()).start();
    let mut events = universe.subscribe();

    assert_ok!(universe.select("HARMONY").await);
    assert!(assert_ok!(universe.snapshot().await).panel_visible);

    let snapshot = assert_ok!(universe.wait_until_idle().await);
    assert!(snapshot.panel_visible);
    assert_eq!(snapshot.output, vec![AWAITING_LINE]);
    assert_eq!(snapshot.block, 0);
    assert_eq!(
        phases(&drain(&mut events)),
        vec![PhaseTag::Focusing, PhaseTag::Idle]
    );

    assert_ok!(universe.close_panel().await);
    assert!(!assert_ok!(universe.snapshot().await).panel_visible);
}

#[tokio::test(start_paused = true)]
async fn test_avatar_failure_restores_placeholder() {
    let universe = start(Ledger::default());

    let options = AvatarOptions {
        base_body: "humanoid".to_string(),
        appearance: "silver hair".to_string(),
        clothing: "a long coat".to_string(),
    };
    assert_eq!(assert_ok!(universe.create_avatar(options).await), 1);

    let snapshot = assert_ok!(universe.wait_for_avatar().await);
    let avatar = snapshot.avatar;
    assert!(!avatar.loading);
    assert_eq!(avatar.image_url.as_deref(), Some(DEFAULT_AVATAR));
    assert_eq!(avatar.slogan.as_deref(), Some(ERROR_SLOGAN));
    assert!(avatar
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("Failed to create an avatar.")));
}

#[tokio::test(start_paused = true)]
async fn test_avatar_success_publishes_portrait_and_thought() {
    let service = Arc::new(StubService {
        text: Some("\"A bright new face.\"".to_string()),
        image: Some(GeneratedImage::jpeg("aGk=")),
    });
    let (universe, _task) = Universe::new(UniverseConfig::default(), service).start();

    let options = AvatarOptions {
        base_body: "android".to_string(),
        appearance: "circuit freckles".to_string(),
        clothing: "a mesh poncho".to_string(),
    };
    assert_ok!(universe.create_avatar(options).await);
    let snapshot = assert_ok!(universe.wait_for_avatar().await);

    assert_eq!(
        snapshot.avatar.image_url.as_deref(),
        Some("data:image/jpeg;base64,aGk=")
    );
    assert_eq!(snapshot.avatar.slogan.as_deref(), Some("\"A bright new face.\""));
    assert!(snapshot.avatar.error.is_none());

    tokio::time::sleep(Duration::from_millis(10)).await;
    let thought = universe.thoughts().borrow().clone();
    assert_eq!(thought.context.as_deref(), Some("avatar_created"));
    assert_eq!(thought.text, "A bright new face.");
}
