//! Story Generation Orchestrator
//!
//! Runs one story request end to end: compose the prompt, call the required
//! text provider (bounded retry on transient errors), then narrate and
//! illustrate the finished story concurrently. Narration and illustration are
//! best-effort; their failures and timeouts become absent references and are
//! never propagated.

use crate::composition::{compose, ComposedPrompt};
use crate::config::StorytellerConfig;
use crate::error::ApiError;
use crate::language::Language;
use crate::provider::image::{
    illustration_prompt, ImageGenerator, OpenAIImageClient, DEFAULT_EXCERPT_CHARS,
};
use crate::provider::speech::{AudioStore, GoogleTranslateSpeech, SpeechSynthesizer};
use crate::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, ProviderFactory,
};
use crate::story::{AudioRef, GenerationResult, StoryRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::{jitter, ExponentialBackoff};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, instrument, warn};

pub const SYSTEM_PROMPT: &str = "You are a friendly story generator.";

const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub text_timeout: Duration,
    pub speech_timeout: Duration,
    pub image_timeout: Duration,
    /// Retries after the first text attempt; 0 disables retry.
    pub max_retries: usize,
    /// Delay before the first retry; doubles per retry.
    pub retry_base_delay: Duration,
    pub excerpt_chars: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            text_timeout: Duration::from_secs(60),
            speech_timeout: Duration::from_secs(60),
            image_timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

struct Narration {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    store: AudioStore,
}

/// Sequences the text, speech, and image providers for each request.
///
/// Holds only shared read-only handles, so one instance serves concurrent
/// requests.
pub struct StoryOrchestrator {
    text: Arc<dyn ModelProviderClient>,
    narration: Option<Narration>,
    images: Option<Arc<dyn ImageGenerator>>,
    settings: GenerationSettings,
}

impl StoryOrchestrator {
    pub fn new(text: Arc<dyn ModelProviderClient>, settings: GenerationSettings) -> Self {
        Self {
            text,
            narration: None,
            images: None,
            settings,
        }
    }

    pub fn with_narration(
        mut self,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: AudioStore,
    ) -> Self {
        self.narration = Some(Narration { synthesizer, store });
        self
    }

    pub fn with_images(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Wire the configured providers. Disabled side generations stay absent.
    pub fn from_config(config: &StorytellerConfig) -> Result<Self, ApiError> {
        let provider = config.text.model_provider()?;
        let text: Arc<dyn ModelProviderClient> =
            Arc::from(ProviderFactory::create_client(&provider)?);
        let mut orchestrator = Self::new(text, config.generation_settings());

        if config.speech.enabled {
            let speech = GoogleTranslateSpeech::new(config.speech.base_url.as_deref())?;
            let store = AudioStore::new(&config.server.static_dir, &config.server.public_prefix);
            orchestrator = orchestrator.with_narration(Arc::new(speech), store);
        }

        if config.image.enabled {
            let api_key = config.image.api_key.clone().ok_or_else(|| {
                ApiError::ConfigError("image.api_key is not set (set OPENAI_API_KEY)".to_string())
            })?;
            let images = OpenAIImageClient::new(
                api_key,
                config.image.base_url.as_deref(),
                config.image.model.clone(),
                config.image.size.clone(),
            )?;
            orchestrator = orchestrator.with_images(Arc::new(images));
        }

        Ok(orchestrator)
    }

    /// Generate story text, narration, and illustration for a validated request.
    ///
    /// Fails only when text generation fails.
    #[instrument(
        skip_all,
        fields(
            language = %request.language,
            attention_span = ?request.attention_span,
            reading_level = ?request.reading_level,
        )
    )]
    pub async fn orchestrate(&self, request: &StoryRequest) -> Result<GenerationResult, ApiError> {
        let prompt = compose(request);
        info!(
            max_tokens = prompt.max_tokens,
            custom_prompt = request.effective_custom_prompt().is_some(),
            provider = self.text.provider_name(),
            model = self.text.model_name(),
            "Generating story"
        );

        let story = self.generate_story(&prompt).await?;
        info!(story_chars = story.chars().count(), "Story text generated");

        let (audio_ref, image_ref) = tokio::join!(
            self.narrate(&story, request.language),
            self.illustrate(&story)
        );

        Ok(GenerationResult {
            story,
            audio_ref,
            image_ref,
        })
    }

    async fn generate_story(&self, prompt: &ComposedPrompt) -> Result<String, ApiError> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt.text.clone()),
        ];
        let options = CompletionOptions {
            temperature: Some(self.settings.temperature),
            max_tokens: Some(prompt.max_tokens),
        };

        let response = self.complete_with_retry(messages, options).await?;
        if let Some(reason) = response.finish_reason.as_deref() {
            debug!(
                finish_reason = reason,
                total_tokens = response.usage.total_tokens,
                "Completion finished"
            );
        }

        let story = response.content.trim();
        if story.is_empty() {
            return Err(ApiError::GenerationFailed(
                "Text provider returned an empty story".to_string(),
            ));
        }
        Ok(story.to_string())
    }

    async fn complete_with_retry(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let factor = (self.settings.retry_base_delay.as_millis() as u64 / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(self.settings.max_retries);

        let attempt = || {
            let client = Arc::clone(&self.text);
            let messages = messages.clone();
            let options = options.clone();
            let timeout = self.settings.text_timeout;
            async move {
                let call = client.complete(messages, options);
                let outcome = match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::ProviderTimeout(format!(
                        "{} did not respond within {:?}",
                        client.provider_name(),
                        timeout
                    ))),
                };
                outcome.map_err(|err| {
                    if err.is_retryable() {
                        warn!(error = %err, "Transient text-generation error");
                        RetryError::Transient {
                            err,
                            retry_after: None,
                        }
                    } else {
                        RetryError::Permanent(err)
                    }
                })
            }
        };

        Retry::spawn(strategy, attempt).await
    }

    async fn narrate(&self, story: &str, language: Language) -> Option<AudioRef> {
        let narration = self.narration.as_ref()?;
        let call = narration.synthesizer.synthesize(story, language);

        let audio = match tokio::time::timeout(self.settings.speech_timeout, call).await {
            Ok(Ok(audio)) => audio,
            Ok(Err(err)) => {
                warn!(
                    provider = narration.synthesizer.provider_name(),
                    error = %err,
                    "Speech synthesis failed; continuing without audio"
                );
                return None;
            }
            Err(_) => {
                warn!(
                    provider = narration.synthesizer.provider_name(),
                    timeout = ?self.settings.speech_timeout,
                    "Speech synthesis timed out; continuing without audio"
                );
                return None;
            }
        };

        // Outside the timeout; a cancelled write leaves a partial file behind.
        match narration.store.persist(&audio).await {
            Ok(audio_ref) => Some(audio_ref),
            Err(err) => {
                warn!(error = %err, "Failed to persist narration; continuing without audio");
                None
            }
        }
    }

    async fn illustrate(&self, story: &str) -> Option<String> {
        let images = self.images.as_ref()?;
        let prompt = illustration_prompt(story, self.settings.excerpt_chars);

        match tokio::time::timeout(self.settings.image_timeout, images.generate(&prompt)).await {
            Ok(Ok(url)) => Some(url),
            Ok(Err(err)) => {
                warn!(
                    provider = images.provider_name(),
                    error = %err,
                    "Image generation failed; continuing without illustration"
                );
                None
            }
            Err(_) => {
                warn!(
                    provider = images.provider_name(),
                    timeout = ?self.settings.image_timeout,
                    "Image generation timed out; continuing without illustration"
                );
                None
            }
        }
    }
}
