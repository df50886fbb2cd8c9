//! Typed values passed between pipeline stages.

use crate::error::{Result, TolkError};
use crate::transcription::Transcript;
use std::path::PathBuf;

/// Translated (or passed-through) text with the language it is in.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedText {
    pub text: String,
    /// ISO 639-1 code of the text's language. On passthrough this is the
    /// source language, not the requested target.
    pub language: String,
}

/// A rendered subtitle file together with the transcript it came from.
#[derive(Debug, Clone)]
pub struct SubtitleFile {
    pub path: PathBuf,
    pub transcript: Transcript,
}

/// An artifact produced by one stage and consumed by the next.
///
/// Artifacts are immutable once produced; a stage never mutates its input,
/// it builds a new artifact.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// A video container on disk.
    Video(PathBuf),
    /// An audio file on disk.
    Audio(PathBuf),
    /// A time-aligned transcript.
    Transcript(Transcript),
    /// Plain text with a language tag.
    Text(TranslatedText),
    /// A subtitle file plus its source transcript.
    Subtitles(SubtitleFile),
}

impl Artifact {
    /// Short kind name for logging and mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Video(_) => "video",
            Artifact::Audio(_) => "audio",
            Artifact::Transcript(_) => "transcript",
            Artifact::Text(_) => "text",
            Artifact::Subtitles(_) => "subtitles",
        }
    }

    pub fn into_video(self) -> Result<PathBuf> {
        match self {
            Artifact::Video(path) => Ok(path),
            other => Err(mismatch("video", &other)),
        }
    }

    pub fn into_audio(self) -> Result<PathBuf> {
        match self {
            Artifact::Audio(path) => Ok(path),
            other => Err(mismatch("audio", &other)),
        }
    }

    pub fn into_transcript(self) -> Result<Transcript> {
        match self {
            Artifact::Transcript(t) => Ok(t),
            other => Err(mismatch("transcript", &other)),
        }
    }

    pub fn into_text(self) -> Result<TranslatedText> {
        match self {
            Artifact::Text(t) => Ok(t),
            other => Err(mismatch("text", &other)),
        }
    }

    pub fn into_subtitles(self) -> Result<SubtitleFile> {
        match self {
            Artifact::Subtitles(s) => Ok(s),
            other => Err(mismatch("subtitles", &other)),
        }
    }
}

fn mismatch(expected: &str, got: &Artifact) -> TolkError {
    TolkError::Pipeline(format!(
        "expected {} artifact, got {}",
        expected,
        got.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_returns_payload() {
        let artifact = Artifact::Audio(PathBuf::from("/tmp/a.mp3"));
        assert_eq!(artifact.into_audio().unwrap(), PathBuf::from("/tmp/a.mp3"));
    }

    #[test]
    fn test_accessor_rejects_wrong_kind() {
        let artifact = Artifact::Video(PathBuf::from("/tmp/v.mp4"));
        let err = artifact.into_audio().unwrap_err();
        assert!(err.to_string().contains("expected audio artifact, got video"));
    }

    #[test]
    fn test_kind_names() {
        let text = Artifact::Text(TranslatedText {
            text: "hei".to_string(),
            language: "no".to_string(),
        });
        assert_eq!(text.kind(), "text");
        assert_eq!(Artifact::Video(PathBuf::new()).kind(), "video");
    }
}
