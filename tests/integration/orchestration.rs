//! End-to-end orchestration with in-process providers

use super::test_utils::{HangingTextProvider, MockImages, MockSpeech, MockTextProvider};
use std::sync::Arc;
use std::time::Duration;
use storyteller::config::{StorytellerConfig, TextProviderKind};
use storyteller::error::ApiError;
use storyteller::language::Language;
use storyteller::orchestrator::{GenerationSettings, StoryOrchestrator};
use storyteller::provider::image::{ImageGenerator, ILLUSTRATION_PREFIX};
use storyteller::provider::speech::{AudioStore, SpeechAudio, SpeechSynthesizer};
use storyteller::story::{AttentionSpan, StoryRequest};
use tempfile::TempDir;
use tokio::sync::Barrier;

fn fast_settings() -> GenerationSettings {
    GenerationSettings {
        retry_base_delay: Duration::from_millis(1),
        ..GenerationSettings::default()
    }
}

#[tokio::test]
async fn test_full_generation_persists_audio() {
    let temp = TempDir::new().unwrap();
    let text = Arc::new(MockTextProvider::replying("  Once upon a time, Mia found a star.  "));
    let speech = Arc::new(MockSpeech::ok());
    let images = Arc::new(MockImages::ok("https://images.test/star.png"));
    let orchestrator = StoryOrchestrator::new(text.clone(), fast_settings())
        .with_narration(speech.clone(), AudioStore::new(temp.path(), "/static"))
        .with_images(images.clone());

    let request = StoryRequest::new("Mia", 5, "adventure").with_language(Language::Es);
    let result = orchestrator.orchestrate(&request).await.unwrap();

    assert_eq!(result.story, "Once upon a time, Mia found a star.");
    assert_eq!(result.image_ref.as_deref(), Some("https://images.test/star.png"));
    assert_eq!(speech.languages(), vec![Language::Es]);
    assert_eq!(
        images.prompts(),
        vec![format!("{}Once upon a time, Mia found a star.", ILLUSTRATION_PREFIX)]
    );

    let audio_ref = result.audio_ref.unwrap();
    let filename = audio_ref.as_str().strip_prefix("/static/").unwrap();
    assert!(temp.path().join(filename).is_file());
}

/// Both side calls wait on one barrier: it only opens if they overlap.
struct RendezvousSpeech(Arc<Barrier>);

#[async_trait::async_trait]
impl SpeechSynthesizer for RendezvousSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        _language: Language,
    ) -> Result<SpeechAudio, ApiError> {
        self.0.wait().await;
        Ok(SpeechAudio {
            bytes: vec![0xFF, 0xF3],
            extension: "mp3",
        })
    }

    fn provider_name(&self) -> &str {
        "rendezvous-speech"
    }
}

struct RendezvousImages(Arc<Barrier>);

#[async_trait::async_trait]
impl ImageGenerator for RendezvousImages {
    async fn generate(&self, _prompt: &str) -> Result<String, ApiError> {
        self.0.wait().await;
        Ok("https://images.test/together.png".to_string())
    }

    fn provider_name(&self) -> &str {
        "rendezvous-images"
    }
}

#[tokio::test]
async fn test_side_generations_run_concurrently() {
    let temp = TempDir::new().unwrap();
    let barrier = Arc::new(Barrier::new(2));
    let orchestrator = StoryOrchestrator::new(
        Arc::new(MockTextProvider::replying("A calm story.")),
        GenerationSettings {
            speech_timeout: Duration::from_secs(5),
            image_timeout: Duration::from_secs(5),
            ..fast_settings()
        },
    )
    .with_narration(
        Arc::new(RendezvousSpeech(barrier.clone())),
        AudioStore::new(temp.path(), "/static"),
    )
    .with_images(Arc::new(RendezvousImages(barrier)));

    let result = orchestrator
        .orchestrate(&StoryRequest::new("Leo", 6, "bedtime"))
        .await
        .unwrap();

    assert!(result.audio_ref.is_some(), "narration never met illustration");
    assert!(result.image_ref.is_some(), "illustration never met narration");
}

#[tokio::test]
async fn test_text_timeout_propagates_after_retries() {
    let temp = TempDir::new().unwrap();
    let text = Arc::new(HangingTextProvider::default());
    let speech = Arc::new(MockSpeech::ok());
    let images = Arc::new(MockImages::ok("https://images.test/a.png"));
    let settings = GenerationSettings {
        text_timeout: Duration::from_millis(20),
        ..fast_settings()
    };
    let orchestrator = StoryOrchestrator::new(text.clone(), settings.clone())
        .with_narration(speech.clone(), AudioStore::new(temp.path(), "/static"))
        .with_images(images.clone());

    let err = orchestrator
        .orchestrate(&StoryRequest::new("Mia", 5, "adventure"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ProviderTimeout(_)), "{:?}", err);
    assert_eq!(text.attempts(), settings.max_retries + 1);
    assert!(speech.languages().is_empty());
    assert!(images.prompts().is_empty());
}

#[tokio::test]
async fn test_illustration_prompt_uses_story_excerpt() {
    let story = "Twinkle ".repeat(100);
    let images = Arc::new(MockImages::ok("https://images.test/a.png"));
    let orchestrator = StoryOrchestrator::new(
        Arc::new(MockTextProvider::replying(&story)),
        GenerationSettings {
            excerpt_chars: 40,
            ..fast_settings()
        },
    )
    .with_images(images.clone());

    orchestrator
        .orchestrate(&StoryRequest::new("Mia", 5, "adventure"))
        .await
        .unwrap();

    let prompt = &images.prompts()[0];
    let excerpt = prompt.strip_prefix(ILLUSTRATION_PREFIX).unwrap();
    assert_eq!(excerpt.chars().count(), 40);
    assert!(story.starts_with(excerpt));
}

#[tokio::test]
async fn test_both_side_failures_still_return_story() {
    let temp = TempDir::new().unwrap();
    let orchestrator = StoryOrchestrator::new(
        Arc::new(MockTextProvider::replying("The owl said goodnight.")),
        fast_settings(),
    )
    .with_narration(
        Arc::new(MockSpeech::failing()),
        AudioStore::new(temp.path(), "/static"),
    )
    .with_images(Arc::new(MockImages::failing()));

    let result = orchestrator
        .orchestrate(&StoryRequest::new("Mia", 5, "adventure"))
        .await
        .unwrap();
    assert_eq!(result.story, "The owl said goodnight.");
    assert!(result.audio_ref.is_none());
    assert!(result.image_ref.is_none());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_text_failure_makes_no_side_calls() {
    let speech = Arc::new(MockSpeech::ok());
    let images = Arc::new(MockImages::ok("https://images.test/a.png"));
    let temp = TempDir::new().unwrap();
    let orchestrator = StoryOrchestrator::new(
        Arc::new(MockTextProvider::failing(ApiError::ProviderModelNotFound(
            "llama-9".to_string(),
        ))),
        fast_settings(),
    )
    .with_narration(speech.clone(), AudioStore::new(temp.path(), "/static"))
    .with_images(images.clone());

    let err = orchestrator
        .orchestrate(&StoryRequest::new("Mia", 5, "adventure"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ProviderModelNotFound(_)));
    assert!(speech.languages().is_empty());
    assert!(images.prompts().is_empty());
}

#[tokio::test]
async fn test_rate_limit_recovers_within_retry_budget() {
    let text = Arc::new(MockTextProvider::scripted(vec![
        Err(ApiError::ProviderRateLimit("slow down".to_string())),
        Ok("Finally, a story.".to_string()),
    ]));
    let orchestrator = StoryOrchestrator::new(text.clone(), fast_settings());

    let result = orchestrator
        .orchestrate(&StoryRequest::new("Mia", 5, "adventure"))
        .await
        .unwrap();
    assert_eq!(result.story, "Finally, a story.");
    assert_eq!(text.calls().len(), 2);
}

#[tokio::test]
async fn test_retry_disabled_with_zero_retries() {
    let text = Arc::new(MockTextProvider::scripted(vec![
        Err(ApiError::ProviderUnavailable("503".to_string())),
        Ok("never reached".to_string()),
    ]));
    let orchestrator = StoryOrchestrator::new(
        text.clone(),
        GenerationSettings {
            max_retries: 0,
            ..fast_settings()
        },
    );

    let err = orchestrator
        .orchestrate(&StoryRequest::new("Mia", 5, "adventure"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ProviderUnavailable(_)));
    assert_eq!(text.calls().len(), 1);
}

#[tokio::test]
async fn test_token_budget_reaches_provider() {
    let text = Arc::new(MockTextProvider::replying("Una historia."));
    let orchestrator = StoryOrchestrator::new(text.clone(), fast_settings());

    let request = StoryRequest::new("Ana", 8, "mystery")
        .with_language(Language::Es)
        .with_attention_span(AttentionSpan::Long);
    orchestrator.orchestrate(&request).await.unwrap();

    let (messages, options) = &text.calls()[0];
    assert_eq!(options.max_tokens, Some(1440));
    assert_eq!(options.temperature, Some(0.7));
    assert_eq!(messages.len(), 2);
    assert!(messages[1].content.contains("Spanish"));
}

#[tokio::test]
async fn test_shared_orchestrator_serves_concurrent_requests() {
    let text = Arc::new(MockTextProvider::scripted(
        (0..8).map(|i| Ok(format!("Story {}", i))).collect(),
    ));
    let orchestrator = Arc::new(StoryOrchestrator::new(text.clone(), fast_settings()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .orchestrate(&StoryRequest::new("Mia", 5, "adventure"))
                    .await
            })
        })
        .collect();

    let mut stories = Vec::new();
    for handle in handles {
        stories.push(handle.await.unwrap().unwrap().story);
    }
    stories.sort();
    assert_eq!(stories.len(), 8);
    stories.dedup();
    assert_eq!(stories.len(), 8);
}

#[test]
fn test_from_config_requires_text_key() {
    let mut config = StorytellerConfig::default();
    config.image.enabled = false;
    assert!(matches!(
        StoryOrchestrator::from_config(&config),
        Err(ApiError::ConfigError(_))
    ));
}

#[test]
fn test_from_config_builds_with_local_provider() {
    let mut config = StorytellerConfig::default();
    config.text.provider = TextProviderKind::Ollama;
    config.speech.enabled = false;
    config.image.enabled = false;
    config.text.timeout_secs = 5;

    let orchestrator = StoryOrchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.settings().text_timeout, Duration::from_secs(5));
}
