//! Story Request and Result Types
//!
//! `StoryRequestBody` is the JSON shape accepted at the HTTP boundary.
//! `StoryRequest` is the validated, immutable value every later stage works
//! with; holding one means the language is supported and every field is in
//! range.

use crate::error::ApiError;
use crate::language::Language;
use serde::{Deserialize, Serialize};

pub const NAME_MAX_CHARS: usize = 30;
pub const AGE_RANGE: std::ops::RangeInclusive<u8> = 1..=12;
pub const GENRE_MIN_CHARS: usize = 3;
pub const GENRE_MAX_CHARS: usize = 30;
pub const PROMPT_MAX_CHARS: usize = 500;

/// Requested narrative length tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionSpan {
    Short,
    #[default]
    Medium,
    Long,
}

impl AttentionSpan {
    pub fn index(self) -> usize {
        match self {
            AttentionSpan::Short => 0,
            AttentionSpan::Medium => 1,
            AttentionSpan::Long => 2,
        }
    }
}

impl std::str::FromStr for AttentionSpan {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(AttentionSpan::Short),
            "medium" => Ok(AttentionSpan::Medium),
            "long" => Ok(AttentionSpan::Long),
            other => Err(ApiError::InvalidRequest(format!(
                "attention_span must be short, medium, or long (got '{}')",
                other
            ))),
        }
    }
}

/// Requested vocabulary and sentence complexity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingLevel {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl ReadingLevel {
    pub fn index(self) -> usize {
        match self {
            ReadingLevel::Basic => 0,
            ReadingLevel::Intermediate => 1,
            ReadingLevel::Advanced => 2,
        }
    }
}

impl std::str::FromStr for ReadingLevel {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ReadingLevel::Basic),
            "intermediate" => Ok(ReadingLevel::Intermediate),
            "advanced" => Ok(ReadingLevel::Advanced),
            other => Err(ApiError::InvalidRequest(format!(
                "reading_level must be basic, intermediate, or advanced (got '{}')",
                other
            ))),
        }
    }
}

/// Unvalidated request as received over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRequestBody {
    pub name: String,
    pub age: i64,
    pub genre: String,
    #[serde(default = "default_language_code")]
    pub language: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub attention_span: AttentionSpan,
    #[serde(default)]
    pub reading_level: ReadingLevel,
}

fn default_language_code() -> String {
    Language::default().code().to_string()
}

/// Validated story request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRequest {
    pub name: String,
    pub age: u8,
    pub genre: String,
    pub language: Language,
    pub custom_prompt: Option<String>,
    pub attention_span: AttentionSpan,
    pub reading_level: ReadingLevel,
}

impl StoryRequest {
    /// Build a request with default language, tiers, and no custom prompt.
    ///
    /// Bypasses boundary validation; callers constructing requests directly
    /// are trusted to stay within the documented ranges.
    pub fn new(name: impl Into<String>, age: u8, genre: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            genre: genre.into(),
            language: Language::default(),
            custom_prompt: None,
            attention_span: AttentionSpan::default(),
            reading_level: ReadingLevel::default(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_attention_span(mut self, attention_span: AttentionSpan) -> Self {
        self.attention_span = attention_span;
        self
    }

    pub fn with_reading_level(mut self, reading_level: ReadingLevel) -> Self {
        self.reading_level = reading_level;
        self
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    /// The custom prompt, if present and not blank.
    pub fn effective_custom_prompt(&self) -> Option<&str> {
        self.custom_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }
}

impl TryFrom<StoryRequestBody> for StoryRequest {
    type Error = ApiError;

    fn try_from(body: StoryRequestBody) -> Result<Self, Self::Error> {
        let language = Language::from_code(&body.language)
            .ok_or_else(|| ApiError::UnsupportedLanguage(body.language.clone()))?;

        let name_len = body.name.chars().count();
        if body.name.trim().is_empty() || name_len > NAME_MAX_CHARS {
            return Err(ApiError::InvalidRequest(format!(
                "name must be 1 to {} characters",
                NAME_MAX_CHARS
            )));
        }

        let age = u8::try_from(body.age)
            .ok()
            .filter(|age| AGE_RANGE.contains(age))
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "age must be between {} and {}",
                    AGE_RANGE.start(),
                    AGE_RANGE.end()
                ))
            })?;

        let genre_len = body.genre.chars().count();
        if !(GENRE_MIN_CHARS..=GENRE_MAX_CHARS).contains(&genre_len) {
            return Err(ApiError::InvalidRequest(format!(
                "genre must be {} to {} characters",
                GENRE_MIN_CHARS, GENRE_MAX_CHARS
            )));
        }

        if let Some(prompt) = &body.prompt {
            if prompt.chars().count() > PROMPT_MAX_CHARS {
                return Err(ApiError::InvalidRequest(format!(
                    "prompt must be at most {} characters",
                    PROMPT_MAX_CHARS
                )));
            }
        }

        Ok(StoryRequest {
            name: body.name,
            age,
            genre: body.genre,
            language,
            custom_prompt: body.prompt,
            attention_span: body.attention_span,
            reading_level: body.reading_level,
        })
    }
}

/// Public location of a persisted narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRef(pub String);

impl AudioRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Assembled output of one orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub story: String,
    pub audio_ref: Option<AudioRef>,
    pub image_ref: Option<String>,
}

/// JSON body returned to HTTP callers. Absent references are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryResponse {
    pub story: String,
    pub audio_url: String,
    pub image_url: String,
}

impl From<GenerationResult> for StoryResponse {
    fn from(result: GenerationResult) -> Self {
        StoryResponse {
            story: result.story,
            audio_url: result.audio_ref.map(|a| a.0).unwrap_or_default(),
            image_url: result.image_ref.unwrap_or_default(),
        }
    }
}
