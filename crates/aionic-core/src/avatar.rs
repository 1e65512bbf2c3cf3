//! Avatar creation flow.
//!
//! Portrait and slogan are requested together. The slogan call cannot
//! fail (it falls back), the portrait can, and a portrait failure is the
//! only generation error a visitor ever sees.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GenerationError;
use crate::genai::{AvatarOptions, GeneratedImage, Generator, ThoughtContext};

/// Placeholder silhouette shown before the first portrait and after failures.
pub const DEFAULT_AVATAR: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHZpZXdCb3g9IjAgMCAxMDAgMTAwIj48Y2lyY2xlIGN4PSI1MCIgY3k9IjQwIiByPSIyNSIgZmlsbD0iIzAwZmZmZiIgb3BhY2l0eT0iMC4yIiAvPjxwYXRoIGQ9Ik0yMCw5NSBDNDAsNzAgNjAsNzAgODAsOTUiIHN0cm9rZT0iIzAwZmZmZiIgc3Ryb2tlLXdpZHRoPSI1IiBzdHJva2Utb3BhY2l0eT0iMC4yIiBmaWxsPSJub25lIiBzdHJva2UtbGluZWNhcD0icm91bmQiLz48L3N2Zz4=";

pub const DEFAULT_SLOGAN: &str = "\"The architect of my own reality.\"";

pub const ERROR_SLOGAN: &str = "\"Error in the code.\"";

/// A finished portrait with its slogan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAvatar {
    pub image: GeneratedImage,
    pub slogan: String,
}

/// Request portrait and slogan concurrently.
pub async fn create(
    generator: &Generator,
    options: &AvatarOptions,
) -> Result<CreatedAvatar, GenerationError> {
    let description = options.description();
    let (image, slogan) = tokio::join!(generator.avatar(options), generator.slogan(&description));

    Ok(CreatedAvatar {
        image: image?,
        slogan,
    })
}

/// What the avatar panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarState {
    /// `None` while a portrait is being generated.
    pub image_url: Option<String>,
    pub slogan: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence number of the latest request.
    pub sequence: u64,
}

impl Default for AvatarState {
    fn default() -> Self {
        Self {
            image_url: Some(DEFAULT_AVATAR.to_string()),
            slogan: Some(DEFAULT_SLOGAN.to_string()),
            loading: false,
            error: None,
            sequence: 0,
        }
    }
}

impl AvatarState {
    /// Enter the loading state and return the new request's sequence number.
    pub fn begin(&mut self) -> u64 {
        self.sequence += 1;
        self.loading = true;
        self.image_url = None;
        self.slogan = None;
        self.error = None;
        self.sequence
    }

    /// Apply a finished request.
    ///
    /// Returns the thought to request on success. Results of superseded
    /// requests are dropped.
    pub fn finish(
        &mut self,
        sequence: u64,
        options: AvatarOptions,
        outcome: Result<CreatedAvatar, GenerationError>,
    ) -> Option<ThoughtContext> {
        if sequence != self.sequence {
            info!(sequence, latest = self.sequence, "Discarding stale avatar result");
            return None;
        }
        self.loading = false;

        match outcome {
            Ok(created) => {
                info!(slogan = %created.slogan, "Avatar created");
                self.image_url = Some(created.image.data_url());
                self.slogan = Some(created.slogan.clone());
                Some(ThoughtContext::AvatarCreated {
                    options,
                    slogan: created.slogan,
                })
            }
            Err(e) => {
                warn!(error = %e, "Failed to generate avatar");
                self.error = Some(format!("Failed to create an avatar. {}", e));
                self.image_url = Some(DEFAULT_AVATAR.to_string());
                self.slogan = Some(ERROR_SLOGAN.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::testing::ScriptedService;
    use crate::genai::SLOGAN_FALLBACK;
    use std::sync::Arc;
    use std::time::Duration;

    fn options() -> AvatarOptions {
        AvatarOptions {
            base_body: "cyborg".to_string(),
            appearance: "glowing tattoos".to_string(),
            clothing: "a plasma jacket".to_string(),
        }
    }

    fn generator(service: ScriptedService) -> Generator {
        Generator::new(Arc::new(service), Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_success() {
        let service = ScriptedService::with_texts([(
            Duration::from_millis(100),
            Ok("\"Wired for wonder.\"".to_string()),
        )]);
        service.push_image(Duration::from_millis(300), Ok(GeneratedImage::jpeg("aGk=")));

        let mut state = AvatarState::default();
        let sequence = state.begin();
        assert!(state.loading);
        assert!(state.image_url.is_none());

        let outcome = create(&generator(service), &options()).await;
        let thought = state.finish(sequence, options(), outcome);

        assert!(!state.loading);
        assert_eq!(state.image_url.as_deref(), Some("data:image/jpeg;base64,aGk="));
        assert_eq!(state.slogan.as_deref(), Some("\"Wired for wonder.\""));
        assert!(matches!(thought, Some(ThoughtContext::AvatarCreated { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slogan_failure_alone_is_silent() {
        let service = ScriptedService::default();
        service.push_image(Duration::ZERO, Ok(GeneratedImage::jpeg("aGk=")));

        let created = create(&generator(service), &options()).await.unwrap();
        assert_eq!(created.slogan, SLOGAN_FALLBACK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_failure_restores_placeholder() {
        let service = ScriptedService::with_texts([(Duration::ZERO, Ok("\"x\"".to_string()))]);
        service.push_image(Duration::ZERO, Err(GenerationError::Empty("an image")));

        let mut state = AvatarState::default();
        let sequence = state.begin();
        let outcome = create(&generator(service), &options()).await;
        let thought = state.finish(sequence, options(), outcome);

        assert!(thought.is_none());
        assert_eq!(state.image_url.as_deref(), Some(DEFAULT_AVATAR));
        assert_eq!(state.slogan.as_deref(), Some(ERROR_SLOGAN));
        let error = state.error.unwrap();
        assert!(error.starts_with("Failed to create an avatar."));
        assert!(error.contains("did not return an image"));
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut state = AvatarState::default();
        let first = state.begin();
        let second = state.begin();
        assert_ne!(first, second);

        let stale = Ok(CreatedAvatar {
            image: GeneratedImage::jpeg("b2xk"),
            slogan: "old".to_string(),
        });
        assert!(state.finish(first, options(), stale).is_none());
        assert!(state.loading);
        assert!(state.image_url.is_none());
    }
}
