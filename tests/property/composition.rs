//! Property-based tests for prompt composition

use proptest::prelude::*;
use storyteller::composition::{compose, CUSTOM_PROMPT_MAX_TOKENS};
use storyteller::language::{token_multiplier, Language};
use storyteller::story::{AttentionSpan, ReadingLevel, StoryRequest};

fn language() -> impl Strategy<Value = Language> {
    prop::sample::select(Language::ALL.to_vec())
}

fn attention_span() -> impl Strategy<Value = AttentionSpan> {
    prop_oneof![
        Just(AttentionSpan::Short),
        Just(AttentionSpan::Medium),
        Just(AttentionSpan::Long),
    ]
}

fn reading_level() -> impl Strategy<Value = ReadingLevel> {
    prop_oneof![
        Just(ReadingLevel::Basic),
        Just(ReadingLevel::Intermediate),
        Just(ReadingLevel::Advanced),
    ]
}

prop_compose! {
    fn story_request()(
        name in "[A-Za-z{}]{1,30}",
        age in 1u8..=12,
        genre in "[a-z {}]{3,30}",
        language in language(),
        attention_span in attention_span(),
        reading_level in reading_level(),
    ) -> StoryRequest {
        StoryRequest::new(name, age, genre)
            .with_language(language)
            .with_attention_span(attention_span)
            .with_reading_level(reading_level)
    }
}

proptest! {
    #[test]
    fn prop_compose_is_deterministic(request in story_request()) {
        prop_assert_eq!(compose(&request), compose(&request));
    }

    #[test]
    fn prop_budget_is_positive(request in story_request()) {
        prop_assert!(compose(&request).max_tokens >= 1);
    }

    #[test]
    fn prop_name_and_genre_appear_verbatim(request in story_request()) {
        let prompt = compose(&request);
        prop_assert!(prompt.text.contains(&request.name));
        prop_assert!(prompt.text.contains(&request.genre));
    }

    #[test]
    fn prop_budget_grows_with_multiplier(
        request in story_request(),
        a in language(),
        b in language(),
    ) {
        let ta = compose(&request.clone().with_language(a)).max_tokens;
        let tb = compose(&request.with_language(b)).max_tokens;
        if token_multiplier(a.code()) > token_multiplier(b.code()) {
            prop_assert!(ta > tb);
        }
    }

    #[test]
    fn prop_budget_grows_with_attention_span(request in story_request()) {
        let budget = |span| compose(&request.clone().with_attention_span(span)).max_tokens;
        let short = budget(AttentionSpan::Short);
        let medium = budget(AttentionSpan::Medium);
        let long = budget(AttentionSpan::Long);
        prop_assert!(short < medium && medium < long);
    }

    #[test]
    fn prop_custom_prompt_overrides_everything(
        request in story_request(),
        custom in "[a-zA-Z][a-zA-Z ,.]{0,200}",
    ) {
        let prompt = compose(&request.with_custom_prompt(custom.clone()));
        prop_assert_eq!(prompt.text, custom);
        prop_assert_eq!(prompt.max_tokens, CUSTOM_PROMPT_MAX_TOKENS);
    }
}
