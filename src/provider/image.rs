//! Illustration generation.

use crate::error::ApiError;
use crate::provider::{build_provider_http_client, ensure_success, map_http_error, trim_base_url};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const ILLUSTRATION_PREFIX: &str = "Children's storybook illustration: ";
pub const DEFAULT_EXCERPT_CHARS: usize = 300;
pub const DEFAULT_IMAGE_SIZE: &str = "512x512";

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return a URL it can be fetched from.
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;

    fn provider_name(&self) -> &str;
}

/// Illustration prompt seeded with the first `max_chars` characters of the story.
pub fn illustration_prompt(story: &str, max_chars: usize) -> String {
    let excerpt: String = story.chars().take(max_chars).collect();
    format!("{}{}", ILLUSTRATION_PREFIX, excerpt)
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// OpenAI images API client.
pub struct OpenAIImageClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: Option<String>,
    size: String,
}

impl OpenAIImageClient {
    pub fn new(
        api_key: String,
        base_url: Option<&str>,
        model: Option<String>,
        size: String,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            api_key,
            base_url: trim_base_url(base_url.unwrap_or(crate::provider::OPENAI_BASE_URL)),
            model,
            size,
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAIImageClient {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let request = ImageGenerationRequest {
            prompt,
            n: 1,
            size: &self.size,
            model: self.model.as_deref(),
        };

        let url = format!("{}/images/generations", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        let parsed: ImageGenerationResponse = response.json().await.map_err(|e| {
            ApiError::ProviderError(format!("Failed to parse image response: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| ApiError::ProviderError("No image URL in response".to_string()))
    }

    fn provider_name(&self) -> &str {
        "openai-images"
    }
}
