//! aionic-core - Core library for the Aionic universe
//!
//! This crate holds everything the universe does apart from drawing it:
//!
//! - **catalog**: Command catalog and the built-in commands
//! - **layout**: Camera anchors and glyph positions per viewport
//! - **focus**: Camera moves with cancellable arrivals
//! - **output**: Bounded terminal buffer and the ledger counter
//! - **script**: Paced script playback and execution sessions
//! - **thought**: Ambient thought stream with idle rescheduling
//! - **avatar**: Avatar portrait and slogan generation
//! - **genai**: Generative service trait and the Gemini client
//! - **universe**: The coordinator that ties it all together

pub mod avatar;
pub mod catalog;
pub mod config;
pub mod error;
pub mod focus;
pub mod genai;
pub mod layout;
pub mod output;
pub mod script;
pub mod thought;
pub mod universe;

// Re-export commonly used types
pub use catalog::{Catalog, Command};
pub use config::UniverseConfig;
pub use error::{Error, GenerationError, Result};
pub use genai::{AvatarOptions, GenerativeService, Generator, ThoughtContext};
pub use layout::{FocusTarget, Viewport};
pub use universe::{
    PhaseTag, SelectOutcome, Universe, UniverseEvent, UniverseHandle, UniverseSnapshot,
};
