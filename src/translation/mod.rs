//! Translation module for Tolk.
//!
//! Target-language validation, the translation service trait, and the
//! summarization pivot policy.

mod openai;

pub use openai::OpenAiTranslator;

use crate::error::Result;
use async_trait::async_trait;

/// Languages accepted as translation and synthesis targets.
///
/// ISO 639-1 code paired with the English name speech models report.
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("no", "Norwegian"),
    ("da", "Danish"),
    ("fi", "Finnish"),
    ("is", "Icelandic"),
    ("pl", "Polish"),
    ("cs", "Czech"),
    ("sk", "Slovak"),
    ("hu", "Hungarian"),
    ("ro", "Romanian"),
    ("bg", "Bulgarian"),
    ("el", "Greek"),
    ("ru", "Russian"),
    ("uk", "Ukrainian"),
    ("tr", "Turkish"),
    ("ar", "Arabic"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("id", "Indonesian"),
    ("ms", "Malay"),
    ("vi", "Vietnamese"),
    ("th", "Thai"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
];

/// Resolve a language given as an ISO code or English name to its code.
///
/// Transcription models report full names ("english"), callers pass codes;
/// both resolve here. Returns `None` for anything outside the table.
pub fn language_code(language: &str) -> Option<&'static str> {
    let needle = language.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(code, name)| *code == needle || name.to_lowercase() == needle)
        .map(|(code, _)| *code)
}

/// English name for a supported language code.
pub fn language_name(language: &str) -> Option<&'static str> {
    let code = language_code(language)?;
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Check whether a language is an accepted target.
pub fn is_supported(language: &str) -> bool {
    language_code(language).is_some()
}

/// Trait for translation services.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate text into the target language. The source language is
    /// detected by the service.
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// How a summarization request routes through translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryPlan {
    /// Translate the input to English before summarizing.
    pub pivot_to_english: bool,
    /// Translate the English summary into the output language afterwards.
    pub translate_summary: bool,
}

/// Decide the summarization route from the language pair alone.
///
/// The summarizer works in English, so any non-English input pivots
/// through English first. The summary is translated back only when the
/// output language differs from English and from the input language.
pub fn summary_plan(input_lang: &str, output_lang: &str) -> SummaryPlan {
    SummaryPlan {
        pivot_to_english: input_lang != "en",
        translate_summary: output_lang != "en" && output_lang != input_lang,
    }
}
