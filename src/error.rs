//! Error types for Tolk.

use thiserror::Error;

/// Library-level error type for Tolk operations.
#[derive(Error, Debug)]
pub enum TolkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Translation service error: {0}")]
    TranslationService(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Stage timed out after {0:?}")]
    StageTimeout(std::time::Duration),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Tolk operations.
pub type Result<T> = std::result::Result<T, TolkError>;
