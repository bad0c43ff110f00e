//! Speech synthesis for story narration.
//!
//! Synthesis is best-effort: the orchestrator discards failures here. Audio is
//! persisted by `AudioStore` under the static directory so it can be fetched by
//! the returned reference.

use crate::error::ApiError;
use crate::language::Language;
use crate::provider::{build_provider_http_client, ensure_success, map_http_error, trim_base_url};
use crate::story::AudioRef;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub const GOOGLE_TRANSLATE_BASE_URL: &str = "https://translate.google.com";

/// The translate endpoint rejects longer `q` values.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Encoded narration audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `mp3`.
    pub extension: &'static str,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Narrate `text` in `language`.
    async fn synthesize(&self, text: &str, language: Language) -> Result<SpeechAudio, ApiError>;

    fn provider_name(&self) -> &str;
}

/// Speech from the public Google Translate TTS endpoint.
///
/// Text is split into chunks of at most `MAX_CHUNK_CHARS` characters, fetched in
/// order and concatenated; MP3 frames concatenate into a playable stream.
pub struct GoogleTranslateSpeech {
    client: Client,
    base_url: String,
}

impl GoogleTranslateSpeech {
    pub fn new(base_url: Option<&str>) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            base_url: trim_base_url(base_url.unwrap_or(GOOGLE_TRANSLATE_BASE_URL)),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateSpeech {
    async fn synthesize(&self, text: &str, language: Language) -> Result<SpeechAudio, ApiError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ApiError::ProviderError("No text to synthesize".to_string()));
        }

        let url = format!("{}/translate_tts", self.base_url);
        let total = chunks.len().to_string();
        let mut bytes = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let response = self
                .client
                .get(&url)
                .header("User-Agent", "Mozilla/5.0")
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language.code()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await
                .map_err(map_http_error)?;
            let response = ensure_success(response).await?;
            let segment = response.bytes().await.map_err(map_http_error)?;
            debug!(chunk = %idx, bytes = segment.len(), "Fetched speech segment");
            bytes.extend_from_slice(&segment);
        }

        Ok(SpeechAudio {
            bytes,
            extension: "mp3",
        })
    }

    fn provider_name(&self) -> &str {
        "google-translate"
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Sentence boundaries are preferred, then word boundaries; a single word
/// longer than the limit is cut without orphaning a vowel sign. Whitespace runs are
/// collapsed to one space. Adjacent short pieces are packed together.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();

    for sentence in sentences(text) {
        let normalized = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            continue;
        }
        if normalized.chars().count() <= max_chars {
            pieces.push(normalized);
            continue;
        }
        let words = normalized.split(' ').flat_map(|word| {
            if word.chars().count() <= max_chars {
                vec![word.to_string()]
            } else {
                hard_split(word, max_chars)
            }
        });
        pieces.extend(pack(words, max_chars));
    }

    pack(pieces, max_chars)
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ';' | '\n' | '।' | '॥')
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        if is_sentence_end(c) {
            let end = idx + c.len_utf8();
            out.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Cut an over-long word into pieces of at most `max_chars`, never leaving a
/// vowel sign or virama at the start of a piece. Falls back to a plain cut
/// when one cluster is longer than the limit.
fn hard_split(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + max_chars).min(chars.len());
        if end < chars.len() {
            let mut cut = end;
            while cut > start && !is_cluster_boundary(chars[cut - 1], chars[cut]) {
                cut -= 1;
            }
            if cut > start {
                end = cut;
            }
        }
        pieces.push(chars[start..end].iter().collect());
        start = end;
    }
    pieces
}

fn is_cluster_boundary(before: char, after: char) -> bool {
    !is_combining_mark(after) && !is_virama(before)
}

fn is_virama(c: char) -> bool {
    matches!(c, '\u{094D}' | '\u{0C4D}')
}

/// Combining marks of the scripts narrated here (Devanagari, Telugu) plus the
/// generic combining diacritics block.
fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{0900}'..='\u{0903}'
            | '\u{093A}'..='\u{094F}'
            | '\u{0951}'..='\u{0957}'
            | '\u{0962}'..='\u{0963}'
            | '\u{0C00}'..='\u{0C04}'
            | '\u{0C3C}'
            | '\u{0C3E}'..='\u{0C56}'
            | '\u{0C62}'..='\u{0C63}'
    )
}

/// Greedily join items with single spaces. Each item must already fit.
fn pack<I>(items: I, max_chars: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for item in items {
        let len = item.chars().count();
        if current_len == 0 {
            current = item;
            current_len = len;
        } else if current_len + 1 + len <= max_chars {
            current.push(' ');
            current.push_str(&item);
            current_len += 1 + len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current = item;
            current_len = len;
        }
    }
    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}

/// Writes narration files into the static directory.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    public_prefix: String,
}

impl AudioStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist audio under a fresh `story_<hex>` name and return its public reference.
    pub async fn persist(&self, audio: &SpeechAudio) -> Result<AudioRef, ApiError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let filename = format!("story_{}.{}", Uuid::new_v4().simple(), audio.extension);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, &audio.bytes).await?;
        debug!(path = %path.display(), bytes = audio.bytes.len(), "Persisted narration");
        Ok(AudioRef(format!("{}/{}", self.public_prefix, filename)))
    }
}
