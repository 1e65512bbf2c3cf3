//! Generative service access - avatars, slogans and ambient thoughts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Generator                         │
//! │  prompts → GenerativeService → timeout → clean/fallback  │
//! └──────────────────────────────────────────────────────────┘
//!                │                          │
//!         GeminiClient (HTTP)        OfflineService (no key)
//! ```
//!
//! The service trait is the only seam to the outside world. [`Generator`]
//! adds prompt building, a per-call timeout and the fallback policy:
//! slogans and thoughts never fail, avatar images do.

#[cfg(feature = "client")]
mod gemini;
mod prompts;

#[cfg(feature = "client")]
pub use gemini::GeminiClient;
pub use prompts::*;

use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::GenerationError;

/// Image returned by the service, still base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub base64_data: String,
}

impl GeneratedImage {
    pub fn jpeg(base64_data: impl Into<String>) -> Self {
        Self {
            mime_type: "image/jpeg".to_string(),
            base64_data: base64_data.into(),
        }
    }

    /// Inline `data:` URL for display.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }

    /// Decode the payload to raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.base64_data.trim())
            .map_err(|e| GenerationError::Malformed(format!("invalid base64 image: {}", e)))
    }
}

/// External generative model service.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Generate free text for a prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Generate a single square image for a prompt.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, GenerationError>;
}

/// Service used when no API key is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineService;

#[async_trait]
impl GenerativeService for OfflineService {
    async fn generate_text(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// Pick the HTTP client when a key is configured, otherwise run offline.
pub fn service_from_config(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenerativeService>, GenerationError> {
    #[cfg(feature = "client")]
    {
        if config.has_api_key() {
            return Ok(Arc::new(GeminiClient::new(config)?));
        }
    }

    debug!(has_key = config.has_api_key(), "Generation running offline");
    Ok(Arc::new(OfflineService))
}

/// Prompted, time-bounded access to a [`GenerativeService`].
#[derive(Clone)]
pub struct Generator {
    service: Arc<dyn GenerativeService>,
    timeout: Duration,
}

impl Generator {
    pub fn new(service: Arc<dyn GenerativeService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, GenerationError>>,
    ) -> Result<T, GenerationError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::timeout(self.timeout.as_millis() as u64)),
        }
    }

    /// Generate an avatar portrait. Errors are returned to the caller.
    pub async fn avatar(&self, options: &AvatarOptions) -> Result<GeneratedImage, GenerationError> {
        debug!(?options, "Generating avatar image");
        let image = self
            .bounded(self.service.generate_image(&avatar_prompt(options)))
            .await
            .inspect_err(|e| warn!(error = %e, "Avatar image generation failed"))?;

        if image.base64_data.trim().is_empty() {
            return Err(GenerationError::Empty("an image"));
        }
        Ok(image)
    }

    /// Generate a slogan; falls back to a fixed line on any failure.
    pub async fn slogan(&self, description: &str) -> String {
        match self.bounded(self.service.generate_text(&slogan_prompt(description))).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Slogan generation returned no text, using fallback");
                SLOGAN_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Slogan generation failed, using fallback");
                SLOGAN_FALLBACK.to_string()
            }
        }
    }

    /// Generate an ambient thought; falls back per context on any failure.
    pub async fn thought(&self, context: &ThoughtContext) -> String {
        match self.bounded(self.service.generate_text(&context.prompt())).await {
            Ok(text) => {
                let cleaned = clean_thought(&text);
                if cleaned.is_empty() {
                    context.fallback().to_string()
                } else {
                    cleaned
                }
            }
            Err(e) => {
                warn!(context = context.as_str(), error = %e, "Thought generation failed, using fallback");
                context.fallback().to_string()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedService;
    use super::*;

    fn generator(service: ScriptedService) -> Generator {
        Generator::new(Arc::new(service), Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_thought_strips_quotes() {
        let generator = generator(ScriptedService::with_texts([(
            Duration::ZERO,
            Ok("\"Memory is a river of light.\"".to_string()),
        )]));

        assert_eq!(
            generator.thought(&ThoughtContext::Idle).await,
            "Memory is a river of light."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_thought_falls_back_on_timeout() {
        let generator = generator(ScriptedService::with_texts([(
            Duration::from_secs(60),
            Ok("too late".to_string()),
        )]));

        assert_eq!(
            generator.thought(&ThoughtContext::Idle).await,
            ThoughtContext::Idle.fallback()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slogan_then_thought_share_one_service() {
        let service = Arc::new(ScriptedService::default());
        service.push_text(Duration::ZERO, Ok("  \"Forged in starlight.\"  ".to_string()));
        service.push_text(Duration::ZERO, Ok("   ".to_string()));
        let generator = Generator::new(service.clone(), Duration::from_secs(30));

        // Slogans keep their quotes; a blank thought falls back.
        assert_eq!(generator.slogan("a cyborg").await, "\"Forged in starlight.\"");
        assert_eq!(
            generator.thought(&ThoughtContext::Idle).await,
            ThoughtContext::Idle.fallback()
        );
        assert_eq!(service.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_offline_slogan_uses_fallback() {
        let generator = Generator::new(Arc::new(OfflineService), Duration::from_secs(1));
        assert_eq!(generator.slogan("anything").await, SLOGAN_FALLBACK);
    }

    #[tokio::test]
    async fn test_avatar_error_is_surfaced() {
        let generator = Generator::new(Arc::new(OfflineService), Duration::from_secs(1));
        let options = AvatarOptions {
            base_body: "a".to_string(),
            appearance: "b".to_string(),
            clothing: "c".to_string(),
        };
        assert_eq!(
            generator.avatar(&options).await,
            Err(GenerationError::NotConfigured)
        );
    }

    #[test]
    fn test_image_data_url_and_decode() {
        let image = GeneratedImage::jpeg("aGVsbG8=");
        assert_eq!(image.data_url(), "data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(image.decode().unwrap(), b"hello");
        assert!(GeneratedImage::jpeg("***").decode().is_err());
    }

    #[test]
    fn test_offline_without_key() {
        let service = service_from_config(&GenerationConfig::default());
        assert!(service.is_ok());
    }
}
