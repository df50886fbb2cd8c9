//! Summarization module for Tolk.
//!
//! Produces English summaries of transcribed or user-supplied text. Inputs
//! in other languages are translated to English by the orchestrator before
//! they reach the summarizer.

mod openai;

pub use openai::OpenAiSummarizer;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for summarization services.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize English `text` and return an English summary.
    async fn summarize(&self, text: &str) -> Result<String>;
}
