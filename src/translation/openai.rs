//! Chat-completion-backed translation.

use super::{language_code, language_name, Translator};
use crate::error::{Result, TolkError};
use crate::openai::{create_client, require_api_key};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Translator backed by an OpenAI chat model.
pub struct OpenAiTranslator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiTranslator {
    /// Create a translator using the given chat model.
    ///
    /// Fails with `ModelUnavailable` when no API credentials are present.
    pub fn new(model: &str) -> Result<Self> {
        require_api_key()?;

        Ok(Self {
            client: create_client(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    #[instrument(skip(self, text), fields(target = %target_language))]
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(TolkError::InvalidInput(
                "Text to translate cannot be empty".to_string(),
            ));
        }

        let code = language_code(target_language)
            .ok_or_else(|| TolkError::UnsupportedLanguage(target_language.to_string()))?;
        let target_name = language_name(code).unwrap_or(code);

        debug!("Translating {} characters", text.len());

        let system_prompt = format!(
            "You are a professional translator. Translate the user's text into {}. \
             Preserve meaning, tone, and formatting. Reply with the translation only.",
            target_name
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| TolkError::TranslationService(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(|e| TolkError::TranslationService(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| TolkError::TranslationService(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TolkError::TranslationService(format!("Translation request failed: {}", e)))?;

        let translated = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| {
                TolkError::TranslationService("Empty response from translation model".to_string())
            })?
            .trim()
            .to_string();

        Ok(translated)
    }
}
