//! Configuration settings for Tolk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub translation: TranslationSettings,
    pub synthesis: SynthesisSettings,
    pub summarization: SummarizationSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for per-run scratch files.
    pub work_dir: String,
    /// Directory for finished products (subtitles, dubbed media).
    pub output_dir: String,
    /// Log level when no -v flag or RUST_LOG is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tolk".to_string(),
            work_dir: "/tmp/tolk".to_string(),
            output_dir: "~/.tolk/output".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum media duration to process (in seconds).
    pub max_duration_seconds: u32,
    /// Maximum concurrent chunk processing.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            chunk_duration_seconds: 120,
            max_duration_seconds: 7200, // 2 hours
            max_concurrent_chunks: 3,
        }
    }
}

/// Translation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// Chat model used for translation.
    pub model: String,
    /// Target language when a command does not specify one.
    pub default_target: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            default_target: "en".to_string(),
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    /// TTS model to use.
    pub model: String,
    /// Voice preset.
    pub voice: String,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Chat model used for summarization.
    pub model: String,
    /// Minimum input length in characters; shorter texts are rejected.
    pub min_input_chars: usize,
    /// Lower bound for summary length in words.
    pub min_summary_words: u32,
    /// Upper bound for summary length in words.
    pub max_summary_words: u32,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            min_input_chars: 100,
            min_summary_words: 60,
            max_summary_words: 250,
        }
    }
}

/// Pipeline execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Default per-stage timeout in seconds.
    pub stage_timeout_seconds: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stage_timeout_seconds: 300,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Maximum upload size in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_mb: 512,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TolkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tolk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded scratch directory path.
    pub fn work_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.work_dir)
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Default per-stage timeout as a Duration.
    pub fn stage_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pipeline.stage_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.transcription.model, "whisper-1");
        assert_eq!(s.translation.default_target, "en");
        assert_eq!(s.summarization.min_input_chars, 100);
        assert_eq!(s.pipeline.stage_timeout_seconds, 300);
        assert_eq!(s.server.port, 8000);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let s: Settings = toml::from_str(
            r#"
            [translation]
            model = "gpt-4o"

            [server]
            port = 9001
            "#,
        )
        .unwrap();
        assert_eq!(s.translation.model, "gpt-4o");
        assert_eq!(s.translation.default_target, "en");
        assert_eq!(s.server.port, 9001);
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.synthesis.voice, "alloy");
    }

    #[test]
    fn expand_path_handles_tilde() {
        let p = Settings::expand_path("~/media");
        assert!(!p.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn round_trips_through_toml() {
        let s = Settings::default();
        let text = toml::to_string_pretty(&s).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.synthesis.model, s.synthesis.model);
        assert_eq!(back.general.log_level, s.general.log_level);
    }
}
