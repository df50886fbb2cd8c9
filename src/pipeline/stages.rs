//! Concrete stages binding media, transcription, translation, and synthesis
//! capabilities into the pipeline runner.

use super::{Artifact, Stage, StageContext, SubtitleFile, TranslatedText};
use crate::error::{Result, TolkError};
use crate::media::MediaProcessor;
use crate::synthesis::SpeechSynthesizer;
use crate::transcription::{format_srt, Transcriber};
use crate::translation::{language_code, Translator};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Extracts the audio track of a video into a scratch MP3.
pub struct ExtractAudioStage {
    media: Arc<dyn MediaProcessor>,
}

impl ExtractAudioStage {
    pub fn new(media: Arc<dyn MediaProcessor>) -> Self {
        Self { media }
    }
}

#[async_trait]
impl Stage for ExtractAudioStage {
    fn name(&self) -> &str {
        "extract-audio"
    }

    async fn execute(&self, input: Artifact, ctx: &mut StageContext) -> Result<Artifact> {
        let video = input.into_video()?;
        let audio_path = ctx.scratch_path("extracted.mp3");
        ctx.register_temp_file(audio_path.clone());

        info!("Extracting audio from {}", video.display());
        self.media.extract_audio(&video, &audio_path).await?;

        Ok(Artifact::Audio(audio_path))
    }
}

/// Transcribes an audio file into a time-aligned transcript.
pub struct TranscribeStage {
    transcriber: Arc<dyn Transcriber>,
}

impl TranscribeStage {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }
}

#[async_trait]
impl Stage for TranscribeStage {
    fn name(&self) -> &str {
        "transcribe"
    }

    async fn execute(&self, input: Artifact, ctx: &mut StageContext) -> Result<Artifact> {
        let audio = input.into_audio()?;

        info!("Transcribing {}", audio.display());
        let transcript = self.transcriber.transcribe(&audio).await?;

        debug!(
            "Transcribed {} segments, {} characters",
            transcript.segments.len(),
            transcript.full_text.len()
        );
        ctx.set_value("transcription", transcript.full_text.clone());

        Ok(Artifact::Transcript(transcript))
    }
}

/// Translates a transcript or text artifact into the target language.
///
/// When the source is already in the target language the text passes
/// through untouched and no translation request is made.
pub struct TranslateStage {
    translator: Arc<dyn Translator>,
    target_language: String,
}

impl TranslateStage {
    pub fn new(translator: Arc<dyn Translator>, target_language: &str) -> Self {
        Self {
            translator,
            target_language: target_language.to_string(),
        }
    }
}

#[async_trait]
impl Stage for TranslateStage {
    fn name(&self) -> &str {
        "translate"
    }

    async fn execute(&self, input: Artifact, ctx: &mut StageContext) -> Result<Artifact> {
        let (text, source_language) = match input {
            Artifact::Transcript(t) => {
                let language = t.language.clone();
                (t.full_text, language)
            }
            Artifact::Text(t) => (t.text, Some(t.language)),
            other => {
                return Err(TolkError::Pipeline(format!(
                    "expected transcript or text artifact, got {}",
                    other.kind()
                )))
            }
        };

        let target_code = language_code(&self.target_language)
            .ok_or_else(|| TolkError::UnsupportedLanguage(self.target_language.clone()))?;
        let source_code = source_language.as_deref().and_then(language_code);

        let translated = if source_code == Some(target_code) {
            debug!("Text already in {}, skipping translation", target_code);
            TranslatedText {
                text,
                language: target_code.to_string(),
            }
        } else {
            info!("Translating to {}", target_code);
            let text = self.translator.translate(&text, &self.target_language).await?;
            TranslatedText {
                text,
                language: target_code.to_string(),
            }
        };

        ctx.set_value("translated_text", translated.text.clone());
        Ok(Artifact::Text(translated))
    }
}

/// Renders text as speech into a scratch MP3.
pub struct SynthesizeStage {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl SynthesizeStage {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Stage for SynthesizeStage {
    fn name(&self) -> &str {
        "synthesize"
    }

    async fn execute(&self, input: Artifact, ctx: &mut StageContext) -> Result<Artifact> {
        let text = input.into_text()?;
        let speech_path = ctx.scratch_path("speech.mp3");
        ctx.register_temp_file(speech_path.clone());

        info!("Synthesizing speech in {}", text.language);
        self.synthesizer
            .synthesize(&text.text, &text.language, &speech_path)
            .await?;

        Ok(Artifact::Audio(speech_path))
    }
}

/// Muxes replacement audio into the source video.
///
/// The output is capped at the source video's duration, so replacement
/// audio longer than the video is truncated and shorter audio simply ends
/// early.
pub struct RemuxStage {
    media: Arc<dyn MediaProcessor>,
    video: PathBuf,
    dest: PathBuf,
}

impl RemuxStage {
    pub fn new(media: Arc<dyn MediaProcessor>, video: PathBuf, dest: PathBuf) -> Self {
        Self { media, video, dest }
    }
}

#[async_trait]
impl Stage for RemuxStage {
    fn name(&self) -> &str {
        "remux"
    }

    async fn execute(&self, input: Artifact, ctx: &mut StageContext) -> Result<Artifact> {
        let audio = input.into_audio()?;
        ctx.declare_output(self.dest.clone());

        let info = self.media.probe(&self.video).await?;
        info!(
            "Muxing replacement audio into {} (capped at {:.1}s)",
            self.dest.display(),
            info.duration_seconds
        );
        self.media
            .replace_audio(&self.video, &audio, &self.dest, info.duration_seconds)
            .await?;

        Ok(Artifact::Video(self.dest.clone()))
    }
}

/// Writes a transcript to disk as an SRT subtitle file.
pub struct RenderSubtitlesStage {
    dest: PathBuf,
}

impl RenderSubtitlesStage {
    pub fn new(dest: PathBuf) -> Self {
        Self { dest }
    }
}

#[async_trait]
impl Stage for RenderSubtitlesStage {
    fn name(&self) -> &str {
        "render-subtitles"
    }

    async fn execute(&self, input: Artifact, ctx: &mut StageContext) -> Result<Artifact> {
        let transcript = input.into_transcript()?;
        ctx.declare_output(self.dest.clone());

        let srt = format_srt(&transcript);
        tokio::fs::write(&self.dest, srt).await?;

        info!("Wrote subtitles to {}", self.dest.display());
        ctx.set_value("subtitle_file", self.dest.display().to_string());

        Ok(Artifact::Subtitles(SubtitleFile {
            path: self.dest.clone(),
            transcript,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::{Transcript, TranscriptSegment};
    use std::sync::Mutex;

    struct RecordingTranslator {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingTranslator {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Translator for RecordingTranslator {
        async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
            self.calls.lock().unwrap().push(target_language.to_string());
            Ok(format!("[{}] {}", target_language, text))
        }
    }

    fn transcript(language: Option<&str>) -> Transcript {
        Transcript::new(
            vec![TranscriptSegment::new(0.0, 2.0, "Hello world".to_string())],
            language.map(|l| l.to_string()),
        )
    }

    #[tokio::test]
    async fn test_translate_stage_calls_translator() {
        let translator = Arc::new(RecordingTranslator::new());
        let stage = TranslateStage::new(translator.clone(), "fr");
        let mut ctx = StageContext::new("run", "/tmp");

        let out = stage
            .execute(Artifact::Transcript(transcript(Some("english"))), &mut ctx)
            .await
            .unwrap();

        let text = out.into_text().unwrap();
        assert_eq!(text.text, "[fr] Hello world");
        assert_eq!(text.language, "fr");
        assert_eq!(*translator.calls.lock().unwrap(), vec!["fr".to_string()]);
    }

    #[tokio::test]
    async fn test_translate_stage_passes_through_same_language() {
        let translator = Arc::new(RecordingTranslator::new());
        let stage = TranslateStage::new(translator.clone(), "en");
        let mut ctx = StageContext::new("run", "/tmp");

        let out = stage
            .execute(Artifact::Transcript(transcript(Some("english"))), &mut ctx)
            .await
            .unwrap();

        let text = out.into_text().unwrap();
        assert_eq!(text.text, "Hello world");
        assert_eq!(text.language, "en");
        assert!(translator.calls.lock().unwrap().is_empty());
        assert_eq!(ctx.value("translated_text"), Some("Hello world"));
    }

    #[tokio::test]
    async fn test_translate_stage_rejects_unknown_target() {
        let translator = Arc::new(RecordingTranslator::new());
        let stage = TranslateStage::new(translator, "klingon");
        let mut ctx = StageContext::new("run", "/tmp");

        let err = stage
            .execute(Artifact::Transcript(transcript(None)), &mut ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, TolkError::UnsupportedLanguage(_)));
    }

    #[tokio::test]
    async fn test_translate_stage_rejects_media_artifacts() {
        let translator = Arc::new(RecordingTranslator::new());
        let stage = TranslateStage::new(translator, "en");
        let mut ctx = StageContext::new("run", "/tmp");

        let err = stage
            .execute(Artifact::Audio(PathBuf::from("/tmp/a.mp3")), &mut ctx)
            .await
            .unwrap_err();

        assert!(err
            .to_string()
            .contains("expected transcript or text artifact, got audio"));
    }

    #[tokio::test]
    async fn test_render_subtitles_writes_srt_and_declares_output() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.srt");
        let stage = RenderSubtitlesStage::new(dest.clone());
        let mut ctx = StageContext::new("run", dir.path());

        let out = stage
            .execute(Artifact::Transcript(transcript(Some("english"))), &mut ctx)
            .await
            .unwrap();

        let subtitles = out.into_subtitles().unwrap();
        assert_eq!(subtitles.path, dest);

        let written = std::fs::read_to_string(&dest).unwrap();
        assert!(written.starts_with("1\n00:00:00,000 --> 00:00:02,000\nHello world"));

        let expected = dest.display().to_string();
        assert_eq!(ctx.value("subtitle_file"), Some(expected.as_str()));
    }
}
