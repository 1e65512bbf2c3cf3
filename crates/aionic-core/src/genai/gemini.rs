//! HTTP client for the Google Generative Language API.
//!
//! Text goes through `models/{model}:generateContent`, portraits through
//! `models/{model}:predict`. The API key travels in the `x-goog-api-key`
//! header.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{GeneratedImage, GenerativeService};
use crate::config::GenerationConfig;
use crate::error::GenerationError;

/// API client for Gemini text and Imagen image models.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client from config.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::NotConfigured)?;

        let timeout = config.request_timeout();
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            timeout,
        })
    }

    /// Map a transport failure, keeping client timeouts distinct from other HTTP errors.
    fn request_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::timeout(self.timeout.as_millis() as u64)
        } else {
            GenerationError::from(e)
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POST a JSON body with the key header and decode the reply.
    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, GenerationError> {
        debug!(url = %url, "Calling generative service");
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                self.request_error(e)
            } else {
                GenerationError::Malformed(e.to_string())
            }
        })
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response: GenerateContentResponse = self
            .post(&self.endpoint(&self.text_model, "generateContent"), &body)
            .await?;

        response.text().ok_or(GenerationError::Empty("any text"))
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, GenerationError> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1",
                "outputOptions": { "mimeType": "image/jpeg" }
            }
        });
        let response: PredictResponse = self
            .post(&self.endpoint(&self.image_model, "predict"), &body)
            .await?;

        response.image().ok_or(GenerationError::Empty("an image"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub(crate) struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Prediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl PredictResponse {
    fn image(self) -> Option<GeneratedImage> {
        let prediction = self.predictions.into_iter().next()?;
        let data = prediction.bytes_base64_encoded.filter(|d| !d.is_empty())?;
        Some(GeneratedImage {
            mime_type: prediction
                .mime_type
                .unwrap_or_else(|| "image/jpeg".to_string()),
            base64_data: data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_key() {
        let result = GeminiClient::new(&GenerationConfig::default());
        assert!(matches!(result, Err(GenerationError::NotConfigured)));
    }

    #[test]
    fn test_endpoint_format() {
        let client = GeminiClient::new(&GenerationConfig {
            api_key: Some("key".to_string()),
            base_url: "https://example.test/v1beta/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.endpoint("gemini-2.5-flash", "generateContent"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_silent_server_maps_to_timeout() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = GeminiClient::new(&GenerationConfig {
            api_key: Some("key".to_string()),
            base_url: format!("http://{}", addr),
            request_timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();

        let err = client.generate_text("hello").await.unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {:?}", err);
        assert_eq!(err, GenerationError::timeout(1000));
        server.abort();
    }

    #[test]
    fn test_parse_content_response() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Silence "},{"text":"sings."}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Silence sings."));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn test_parse_predict_response() {
        let response: PredictResponse = serde_json::from_str(
            r#"{"predictions":[{"bytesBase64Encoded":"aGk=","mimeType":"image/png"}]}"#,
        )
        .unwrap();
        let image = response.image().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.base64_data, "aGk=");

        let missing: PredictResponse = serde_json::from_str(r#"{"predictions":[{}]}"#).unwrap();
        assert!(missing.image().is_none());
    }
}
