//! Chat-completion-backed summarization.

use super::Summarizer;
use crate::error::{Result, TolkError};
use crate::openai::{create_client, require_api_key};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Summarizer backed by an OpenAI chat model.
pub struct OpenAiSummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    min_words: u32,
    max_words: u32,
}

impl OpenAiSummarizer {
    /// Create a summarizer with the given chat model and summary length bounds.
    ///
    /// Fails with `ModelUnavailable` when no API credentials are present.
    pub fn with_config(model: &str, min_words: u32, max_words: u32) -> Result<Self> {
        require_api_key()?;

        Ok(Self {
            client: create_client(),
            model: model.to_string(),
            min_words,
            max_words,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(skip(self, text))]
    async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(TolkError::InvalidInput(
                "Text to summarize cannot be empty".to_string(),
            ));
        }

        debug!("Summarizing {} characters", text.len());

        let system_prompt = format!(
            "You are an expert at summarizing text. Write a concise summary of the \
             user's text in English, between {} and {} words. Cover the main points \
             without editorializing. Reply with the summary only.",
            self.min_words, self.max_words
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| TolkError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(|e| TolkError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| TolkError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| {
                TolkError::Summarization(format!("Summarization request failed: {}", e))
            })?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| {
                TolkError::Summarization("Empty response from summarization model".to_string())
            })?
            .trim()
            .to_string();

        Ok(summary)
    }
}
