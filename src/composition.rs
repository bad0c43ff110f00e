//! Prompt Composition
//!
//! Turns a validated `StoryRequest` into the instruction text and output token
//! budget sent to the text-generation provider. Composition is a pure function
//! of the request: no I/O, no clock, no randomness.

use crate::language::{self, NativeScriptTemplate};
use crate::story::{AttentionSpan, ReadingLevel, StoryRequest};
use serde::{Deserialize, Serialize};

/// Budget used when the caller supplies their own prompt.
pub const CUSTOM_PROMPT_MAX_TOKENS: u32 = 300;

/// Final prompt text and output token budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    pub text: String,
    pub max_tokens: u32,
}

/// Base output tokens for an attention span, before language scaling.
pub fn base_tokens(span: AttentionSpan) -> u32 {
    match span {
        AttentionSpan::Short => 150,
        AttentionSpan::Medium => 400,
        AttentionSpan::Long => 800,
    }
}

pub fn length_descriptor(span: AttentionSpan) -> &'static str {
    match span {
        AttentionSpan::Short => "a very short story",
        AttentionSpan::Medium => "a complete story with beginning, middle, and end",
        AttentionSpan::Long => "a longer, more detailed story",
    }
}

pub fn complexity_descriptor(level: ReadingLevel) -> &'static str {
    match level {
        ReadingLevel::Basic => "written in simple, easy-to-understand language",
        ReadingLevel::Intermediate => "with clear language and moderate complexity",
        ReadingLevel::Advanced => "with rich vocabulary and complex sentence structure",
    }
}

/// Scale a base budget by a language multiplier. Never returns zero.
pub fn scaled_tokens(base: u32, multiplier: f32) -> u32 {
    let scaled = (base as f32 * multiplier).round();
    if scaled < 1.0 {
        1
    } else {
        scaled as u32
    }
}

/// Compose the generation prompt for a request.
pub fn compose(request: &StoryRequest) -> ComposedPrompt {
    if let Some(custom) = request.effective_custom_prompt() {
        return ComposedPrompt {
            text: custom.to_string(),
            max_tokens: CUSTOM_PROMPT_MAX_TOKENS,
        };
    }

    let code = request.language.code();
    let max_tokens = scaled_tokens(
        base_tokens(request.attention_span),
        language::token_multiplier(code),
    );

    let text = match language::native_template(code) {
        Some(template) => render_native(template, request),
        None => render_generic(request, language::display_name(code)),
    };

    ComposedPrompt { text, max_tokens }
}

fn render_generic(request: &StoryRequest, lang_name: &str) -> String {
    format!(
        "Write {length} entirely in {lang} language for a {age}-year-old child named {name}. \
         The story should be in the {genre} genre, {complexity}, \
         have a clear beginning, middle, and conclusion with a moral lesson. \
         End with a positive, calming message for bedtime. \
         IMPORTANT: Respond ONLY in {lang}, do not include any text in another language.",
        length = length_descriptor(request.attention_span),
        lang = lang_name,
        age = request.age,
        name = request.name,
        genre = request.genre,
        complexity = complexity_descriptor(request.reading_level),
    )
}

fn render_native(template: &NativeScriptTemplate, request: &StoryRequest) -> String {
    let age = request.age.to_string();
    render_placeholders(template.body, |key| match key {
        "name" => Some(request.name.as_str()),
        "age" => Some(age.as_str()),
        "genre" => Some(request.genre.as_str()),
        "length" => Some(template.length_descriptors[request.attention_span.index()]),
        "complexity" => Some(template.complexity_descriptors[request.reading_level.index()]),
        _ => None,
    })
}

/// Substitute `{key}` placeholders in one pass.
///
/// Substituted values are copied verbatim and never rescanned. Unknown keys and
/// unbalanced braces are left as written.
pub fn render_placeholders<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match lookup(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
