//! Supported Languages
//!
//! Static language table consulted by prompt composition. Each entry carries the
//! display name handed to the model, the token multiplier that compensates for
//! script density, and optionally a native-script prompt template.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A story language the service accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Te,
    Hi,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::Te,
        Language::Hi,
    ];

    /// ISO 639-1 code, also used as the speech-synthesis language.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Te => "te",
            Language::Hi => "hi",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        Language::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Prompt template written in the target language itself.
///
/// The body uses `{name}`, `{age}`, `{genre}`, `{length}` and `{complexity}`
/// placeholders. Descriptor arrays are indexed short/medium/long and
/// basic/intermediate/advanced respectively.
#[derive(Debug)]
pub struct NativeScriptTemplate {
    pub body: &'static str,
    pub length_descriptors: [&'static str; 3],
    pub complexity_descriptors: [&'static str; 3],
}

/// Static per-language settings.
#[derive(Debug)]
pub struct LanguageProfile {
    pub code: &'static str,
    pub name: &'static str,
    pub token_multiplier: f32,
    pub native_template: Option<&'static NativeScriptTemplate>,
}

static TELUGU_TEMPLATE: NativeScriptTemplate = NativeScriptTemplate {
    body: "తెలుగు భాషలో మాత్రమే సంపూర్ణంగా రాయండి. \
{age}-సంవత్సరాల వయస్సు గల {name} పేరు గల పిల్లకు {genre} శైలిలో {complexity} {length} రాయండి.\n\n\
కథను ఈ విధంగా నిర్మించండి:\n\
1. మొదటి భాగం: కథ ప్రారంభం మరియు పాత్రల పరిచయం\n\
2. మధ్య భాగం: సమస్య లేదా సంఘటన\n\
3. ముగింపు భాగం: సమస్య పరిష్కారం మరియు నీతి పాఠం\n\n\
కథ చివరిలో తప్పకుండా నీతి పాఠం చెప్పండి. \
బెడ్‌టైమ్ కోసం సానుకూల, శాంత సందేశంతో ముగించండి. \
కథను సంపూర్ణంగా తెలుగులో మాత్రమే రాయండి, ఎటువంటి ఇంగ్లీష్ టెక్స్ట్ ఉండకూడదు.",
    length_descriptors: [
        "చాలా చిన్న కథ",
        "ప్రారంభం, మధ్య భాగం మరియు ముగింపు కలిగిన పూర్తి కథ",
        "మరింత వివరమైన పొడవైన కథ",
    ],
    complexity_descriptors: [
        "సరళమైన, సులభంగా అర్థమయ్యే భాషలో",
        "స్పష్టమైన భాషలో, మితమైన క్లిష్టతతో",
        "సమృద్ధమైన పదజాలం మరియు క్లిష్టమైన వాక్య నిర్మాణంతో",
    ],
};

static PROFILES: [LanguageProfile; 6] = [
    LanguageProfile {
        code: "en",
        name: "English",
        token_multiplier: 1.0,
        native_template: None,
    },
    LanguageProfile {
        code: "es",
        name: "Spanish",
        token_multiplier: 1.8,
        native_template: None,
    },
    LanguageProfile {
        code: "fr",
        name: "French",
        token_multiplier: 1.8,
        native_template: None,
    },
    LanguageProfile {
        code: "de",
        name: "German",
        token_multiplier: 1.8,
        native_template: None,
    },
    LanguageProfile {
        code: "te",
        name: "Telugu",
        token_multiplier: 2.5,
        native_template: Some(&TELUGU_TEMPLATE),
    },
    LanguageProfile {
        code: "hi",
        name: "Hindi",
        token_multiplier: 2.5,
        native_template: None,
    },
];

const FALLBACK_MULTIPLIER: f32 = 1.0;

impl LanguageProfile {
    pub fn lookup(code: &str) -> Option<&'static LanguageProfile> {
        PROFILES.iter().find(|profile| profile.code == code)
    }

    pub fn all() -> &'static [LanguageProfile] {
        &PROFILES
    }
}

/// Human-readable language name, or the raw code when unmapped.
pub fn display_name(code: &str) -> &str {
    LanguageProfile::lookup(code)
        .map(|profile| profile.name)
        .unwrap_or(code)
}

pub fn token_multiplier(code: &str) -> f32 {
    LanguageProfile::lookup(code)
        .map(|profile| profile.token_multiplier)
        .unwrap_or(FALLBACK_MULTIPLIER)
}

pub fn native_template(code: &str) -> Option<&'static NativeScriptTemplate> {
    LanguageProfile::lookup(code).and_then(|profile| profile.native_template)
}
