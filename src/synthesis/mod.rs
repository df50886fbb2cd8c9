//! Speech synthesis module for Tolk.
//!
//! Text-to-speech through the OpenAI audio API, used to produce the
//! replacement soundtrack when dubbing a video.

mod openai;

pub use openai::OpenAiSynthesizer;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for speech synthesis services.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` as spoken audio in the given language and write the
    /// result to `dest` as MP3.
    async fn synthesize(&self, text: &str, language: &str, dest: &Path) -> Result<()>;
}
