//! Configuration System
//!
//! Layered configuration for the storyteller service: built-in defaults, then the
//! global and workspace TOML files, then `STORYTELLER__SECTION__KEY` environment
//! variables. Conventional provider variables (`GROQ_API_KEY`, `GROQ_MODEL`,
//! `OPENAI_API_KEY`) fill in whatever is still unset. `validate` runs once at
//! startup; any error there is fatal.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::orchestrator::GenerationSettings;
use crate::provider::image::{DEFAULT_EXCERPT_CHARS, DEFAULT_IMAGE_SIZE};
use crate::provider::ModelProvider;
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod sources;

pub use sources::global_file::global_config_path;

pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorytellerConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub text: TextGenerationConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory served under `public_prefix`; narration files are written here.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_public_prefix() -> String {
    "/static".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
            public_prefix: default_public_prefix(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextProviderKind {
    #[default]
    Groq,
    OpenAI,
    Ollama,
}

impl TextProviderKind {
    /// Conventional environment variable holding this provider's API key.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            TextProviderKind::Groq => Some("GROQ_API_KEY"),
            TextProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            TextProviderKind::Ollama => None,
        }
    }

    fn model_env(self) -> Option<&'static str> {
        match self {
            TextProviderKind::Groq => Some("GROQ_MODEL"),
            _ => None,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            TextProviderKind::Groq => DEFAULT_GROQ_MODEL,
            TextProviderKind::OpenAI => DEFAULT_OPENAI_MODEL,
            TextProviderKind::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }
}

/// Required text-generation provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationConfig {
    #[serde(default)]
    pub provider: TextProviderKind,

    /// Defaults per provider when unset
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            provider: TextProviderKind::default(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl TextGenerationConfig {
    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// Convert to a provider description; fails if a required key is missing.
    pub fn model_provider(&self) -> Result<ModelProvider, ApiError> {
        let model = self.resolved_model();
        let require_key = || {
            self.api_key.clone().ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "text provider API key is not set (set {})",
                    self.provider.api_key_env().unwrap_or("text.api_key")
                ))
            })
        };
        Ok(match self.provider {
            TextProviderKind::Groq => ModelProvider::Groq {
                model,
                api_key: require_key()?,
                base_url: self.base_url.clone(),
            },
            TextProviderKind::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: require_key()?,
                base_url: self.base_url.clone(),
            },
            TextProviderKind::Ollama => ModelProvider::Ollama {
                model,
                base_url: self.base_url.clone(),
            },
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.provider.api_key_env().is_some()
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(format!(
                "API key is required (set {} or text.api_key)",
                self.provider.api_key_env().unwrap_or("text.api_key")
            ));
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err("Model cannot be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "Temperature {} is outside 0.0..=2.0",
                self.temperature
            ));
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be positive".to_string());
        }
        validate_url(self.base_url.as_deref())
    }
}

/// Best-effort narration provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SpeechConfig {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be positive".to_string());
        }
        validate_url(self.base_url.as_deref())
    }
}

/// Best-effort illustration provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_image_size")]
    pub size: String,

    /// Story characters included in the illustration prompt
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_image_size() -> String {
    DEFAULT_IMAGE_SIZE.to_string()
}

fn default_excerpt_chars() -> usize {
    DEFAULT_EXCERPT_CHARS
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            model: None,
            size: default_image_size(),
            excerpt_chars: default_excerpt_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ImageConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(
                "API key is required when enabled (set OPENAI_API_KEY or image.enabled = false)"
                    .to_string(),
            );
        }
        if !is_image_size(&self.size) {
            return Err(format!("Invalid size '{}' (expected WIDTHxHEIGHT)", self.size));
        }
        if self.excerpt_chars == 0 {
            return Err("excerpt_chars must be positive".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be positive".to_string());
        }
        validate_url(self.base_url.as_deref())
    }
}

fn is_image_size(size: &str) -> bool {
    match size.split_once('x') {
        Some((w, h)) => {
            !w.is_empty()
                && !h.is_empty()
                && w.chars().all(|c| c.is_ascii_digit())
                && h.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn validate_url(url: Option<&str>) -> Result<(), String> {
    match url {
        Some(url) => reqwest::Url::parse(url)
            .ok()
            .filter(|u| u.scheme() == "http" || u.scheme() == "https")
            .map(|_| ())
            .ok_or_else(|| format!("Invalid base_url '{}'", url)),
        None => Ok(()),
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ApiError> {
        self.bind
            .parse()
            .map_err(|e| {
                ApiError::ConfigError(format!("Invalid bind address '{}': {}", self.bind, e))
            })
    }

    fn validate(&self) -> Result<(), String> {
        self.bind_addr().map_err(|e| e.to_string())?;
        if self.static_dir.as_os_str().is_empty() {
            return Err("static_dir cannot be empty".to_string());
        }
        if !self.public_prefix.trim_end_matches('/').starts_with('/') {
            return Err(format!(
                "public_prefix '{}' must be a path below '/'",
                self.public_prefix
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Server(String),
    Text(String),
    Speech(String),
    Image(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Server(msg) => write!(f, "Server: {}", msg),
            ValidationError::Text(msg) => write!(f, "Text provider: {}", msg),
            ValidationError::Speech(msg) => write!(f, "Speech provider: {}", msg),
            ValidationError::Image(msg) => write!(f, "Image provider: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl StorytellerConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.server.validate() {
            errors.push(ValidationError::Server(e));
        }
        if let Err(e) = self.text.validate() {
            errors.push(ValidationError::Text(e));
        }
        if self.speech.enabled {
            if let Err(e) = self.speech.validate() {
                errors.push(ValidationError::Speech(e));
            }
        }
        if let Err(e) = self.image.validate() {
            errors.push(ValidationError::Image(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every error into one `ApiError::ConfigError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Fill unset provider values from conventional environment variables.
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.text.api_key.is_none() {
            if let Some(var) = self.text.provider.api_key_env() {
                self.text.api_key = lookup(var);
            }
        }
        if self.text.model.is_none() {
            if let Some(var) = self.text.provider.model_env() {
                self.text.model = lookup(var);
            }
        }
        if self.image.api_key.is_none() {
            self.image.api_key = lookup("OPENAI_API_KEY");
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.text.temperature,
            text_timeout: Duration::from_secs(self.text.timeout_secs),
            speech_timeout: Duration::from_secs(self.speech.timeout_secs),
            image_timeout: Duration::from_secs(self.image.timeout_secs),
            max_retries: self.text.max_retries,
            retry_base_delay: Duration::from_millis(self.text.retry_base_delay_ms),
            excerpt_chars: self.image.excerpt_chars,
        }
    }
}

/// Loads `StorytellerConfig` from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the global file, `<root>/config/*.toml`, and the environment.
    pub fn load(root: &Path) -> Result<StorytellerConfig, ApiError> {
        let builder = Config::builder();
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, root)?;
        let builder = sources::env::add_to_builder(builder);
        Self::finish(builder.build()?)
    }

    /// Load from one explicit file plus the environment.
    pub fn load_from_file(path: &Path) -> Result<StorytellerConfig, ApiError> {
        let builder = Config::builder().add_source(File::from(path).required(true));
        let builder = sources::env::add_to_builder(builder);
        Self::finish(builder.build()?)
    }

    fn finish(config: Config) -> Result<StorytellerConfig, ApiError> {
        let mut config: StorytellerConfig = config.try_deserialize()?;
        config.apply_env_fallbacks(|var| std::env::var(var).ok().filter(|v| !v.is_empty()));
        Ok(config)
    }
}
