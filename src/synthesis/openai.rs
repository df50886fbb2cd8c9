//! OpenAI text-to-speech implementation.

use super::SpeechSynthesizer;
use crate::error::{Result, TolkError};
use crate::openai::{create_client, require_api_key};
use crate::translation::language_code;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// OpenAI TTS-based speech synthesizer.
pub struct OpenAiSynthesizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    voice: String,
}

impl OpenAiSynthesizer {
    /// Create a new synthesizer with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config("tts-1", "alloy")
    }

    /// Create a new synthesizer with a custom model and voice.
    ///
    /// Fails with `ModelUnavailable` when no API credentials are present.
    pub fn with_config(model: &str, voice: &str) -> Result<Self> {
        require_api_key()?;

        Ok(Self {
            client: create_client(),
            model: model.to_string(),
            voice: voice.to_string(),
        })
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }

    fn speech_voice(&self) -> Voice {
        match self.voice.to_lowercase().as_str() {
            "alloy" => Voice::Alloy,
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            other => {
                warn!("Unknown voice '{}', falling back to alloy", other);
                Voice::Alloy
            }
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    #[instrument(skip(self, text), fields(language = %language, dest = %dest.display()))]
    async fn synthesize(&self, text: &str, language: &str, dest: &Path) -> Result<()> {
        if text.trim().is_empty() {
            return Err(TolkError::Synthesis("No text to synthesize".to_string()));
        }

        if language_code(language).is_none() {
            return Err(TolkError::Synthesis(format!(
                "Unsupported language for speech synthesis: {}",
                language
            )));
        }

        info!("Synthesizing {} characters of speech", text.len());
        debug!("Using model {} with voice {}", self.model, self.voice);

        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(self.speech_model())
            .voice(self.speech_voice())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| TolkError::Synthesis(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| TolkError::Synthesis(format!("Speech request failed: {}", e)))?;

        response
            .save(dest)
            .await
            .map_err(|e| TolkError::Synthesis(format!("Failed to write audio: {}", e)))?;

        info!("Wrote synthesized audio to {}", dest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer(model: &str, voice: &str) -> OpenAiSynthesizer {
        OpenAiSynthesizer {
            client: crate::openai::create_client(),
            model: model.to_string(),
            voice: voice.to_string(),
        }
    }

    #[test]
    fn test_speech_model_mapping() {
        assert_eq!(synthesizer("tts-1", "alloy").speech_model(), SpeechModel::Tts1);
        assert_eq!(
            synthesizer("tts-1-hd", "alloy").speech_model(),
            SpeechModel::Tts1Hd
        );
        assert_eq!(
            synthesizer("custom-tts", "alloy").speech_model(),
            SpeechModel::Other("custom-tts".to_string())
        );
    }

    #[test]
    fn test_voice_mapping() {
        assert_eq!(synthesizer("tts-1", "alloy").speech_voice(), Voice::Alloy);
        assert_eq!(synthesizer("tts-1", "echo").speech_voice(), Voice::Echo);
        assert_eq!(synthesizer("tts-1", "fable").speech_voice(), Voice::Fable);
        assert_eq!(synthesizer("tts-1", "onyx").speech_voice(), Voice::Onyx);
        assert_eq!(synthesizer("tts-1", "nova").speech_voice(), Voice::Nova);
        assert_eq!(synthesizer("tts-1", "Shimmer").speech_voice(), Voice::Shimmer);
    }

    #[test]
    fn test_unknown_voice_falls_back_to_alloy() {
        assert_eq!(synthesizer("tts-1", "robotic").speech_voice(), Voice::Alloy);
        // Voices newer than the API surface we build against behave the same.
        assert_eq!(synthesizer("tts-1", "coral").speech_voice(), Voice::Alloy);
        assert_eq!(synthesizer("tts-1", "sage").speech_voice(), Voice::Alloy);
    }
}
