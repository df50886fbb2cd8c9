//! Job orchestrator for Tolk.
//!
//! Wires concrete media, transcription, translation, synthesis, and
//! summarization services into the standard pipelines and exposes them as
//! the jobs the CLI and the HTTP server run.

use crate::config::Settings;
use crate::error::{Result, TolkError};
use crate::media::{is_video_file, FfmpegMediaProcessor, MediaInfo, MediaProcessor};
use crate::pipeline::stages::{
    ExtractAudioStage, RemuxStage, RenderSubtitlesStage, SynthesizeStage, TranscribeStage,
    TranslateStage,
};
use crate::pipeline::{Artifact, Pipeline, PipelineOutcome, StageContext};
use crate::summarize::{OpenAiSummarizer, Summarizer};
use crate::synthesis::{OpenAiSynthesizer, SpeechSynthesizer};
use crate::transcription::{Transcriber, WhisperTranscriber};
use crate::translation::{language_code, summary_plan, OpenAiTranslator, Translator};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// Minimum words a text must have, after any pivot to English, before it is
/// worth summarizing.
const MIN_SUMMARY_INPUT_WORDS: usize = 20;

/// The main orchestrator for Tolk jobs.
pub struct Orchestrator {
    settings: Settings,
    media: Arc<dyn MediaProcessor>,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    summarizer: Arc<dyn Summarizer>,
    work_dir: PathBuf,
    output_dir: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator with the default service implementations.
    pub fn new(settings: Settings) -> Result<Self> {
        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::with_config(
            &settings.transcription.model,
            settings.transcription.chunk_duration_seconds,
            settings.transcription.max_concurrent_chunks,
        )?);

        let translator: Arc<dyn Translator> =
            Arc::new(OpenAiTranslator::new(&settings.translation.model)?);

        let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(OpenAiSynthesizer::with_config(
            &settings.synthesis.model,
            &settings.synthesis.voice,
        )?);

        let summarizer: Arc<dyn Summarizer> = Arc::new(OpenAiSummarizer::with_config(
            &settings.summarization.model,
            settings.summarization.min_summary_words,
            settings.summarization.max_summary_words,
        )?);

        Self::with_components(
            settings,
            Arc::new(FfmpegMediaProcessor::new()),
            transcriber,
            translator,
            synthesizer,
            summarizer,
        )
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        media: Arc<dyn MediaProcessor>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        let work_dir = settings.work_dir();
        let output_dir = settings.output_dir();
        std::fs::create_dir_all(&work_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        Ok(Self {
            settings,
            media,
            transcriber,
            translator,
            synthesizer,
            summarizer,
            work_dir,
            output_dir,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directory where finished products are written.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Transcribe an audio file, write an SRT next to the other products,
    /// and translate the transcription to English.
    #[instrument(skip(self), fields(audio = %audio.display()))]
    pub async fn transcribe_audio(&self, audio: &Path) -> Result<TranscriptionJob> {
        self.check_duration(audio).await?;

        let run_id = Uuid::new_v4().to_string();
        let dest = self
            .output_dir
            .join(format!("{}.srt", file_stem(audio, &run_id)));

        let pipeline = Pipeline::builder("transcribe")
            .add_stage(TranscribeStage::new(self.transcriber.clone()))
            .add_stage(RenderSubtitlesStage::new(dest))
            .stage_timeout(self.settings.stage_timeout())
            .build();

        let mut ctx = StageContext::new(run_id, self.work_dir.clone());
        let outcome = pipeline
            .run(Artifact::Audio(audio.to_path_buf()), &mut ctx)
            .await;
        let products = unpack(outcome)?;

        let subtitles = products.artifact.into_subtitles()?;
        let transcription = subtitles.transcript.full_text.clone();
        let translation = self
            .translate_unless_already(&transcription, subtitles.transcript.language.as_deref(), "en")
            .await?;

        Ok(TranscriptionJob {
            transcription,
            translation,
            subtitle_path: subtitles.path,
        })
    }

    /// Generate subtitles for a video or audio file.
    ///
    /// The SRT file is always in the language the transcriber detected; the
    /// returned text is additionally translated when the target is not
    /// English.
    #[instrument(skip(self), fields(media = %media.display(), target = %target_language))]
    pub async fn generate_subtitles(
        &self,
        media: &Path,
        target_language: &str,
    ) -> Result<SubtitleJob> {
        self.check_duration(media).await?;

        let run_id = Uuid::new_v4().to_string();
        let dest = self
            .output_dir
            .join(format!("{}.srt", file_stem(media, &run_id)));

        let mut builder =
            Pipeline::builder("subtitles").stage_timeout(self.settings.stage_timeout());
        let initial = if is_video_file(media) {
            builder = builder.add_stage(ExtractAudioStage::new(self.media.clone()));
            Artifact::Video(media.to_path_buf())
        } else {
            Artifact::Audio(media.to_path_buf())
        };
        let pipeline = builder
            .add_stage(TranscribeStage::new(self.transcriber.clone()))
            .add_stage(RenderSubtitlesStage::new(dest))
            .build();

        let mut ctx = StageContext::new(run_id, self.work_dir.clone());
        let outcome = pipeline.run(initial, &mut ctx).await;
        let products = unpack(outcome)?;

        let subtitles = products.artifact.into_subtitles()?;
        let transcription = subtitles.transcript.full_text.clone();
        let text = if language_code(target_language) == Some("en") {
            transcription.clone()
        } else {
            self.translator
                .translate(&transcription, target_language)
                .await?
        };

        Ok(SubtitleJob {
            transcription,
            subtitles: text,
            subtitle_path: subtitles.path,
        })
    }

    /// Dub a video into the target language.
    ///
    /// Extracts the audio, transcribes and translates it, synthesizes
    /// speech, and muxes the speech back over the original picture. The
    /// output is capped at the source video's duration.
    #[instrument(skip(self), fields(video = %video.display(), target = %target_language))]
    pub async fn dub_video(&self, video: &Path, target_language: &str) -> Result<DubJob> {
        self.check_duration(video).await?;

        let run_id = Uuid::new_v4().to_string();
        let dest = self
            .output_dir
            .join(format!("{}_translated.mp4", file_stem(video, &run_id)));

        let pipeline = Pipeline::builder("dub")
            .add_stage(ExtractAudioStage::new(self.media.clone()))
            .add_stage(TranscribeStage::new(self.transcriber.clone()))
            .add_stage(TranslateStage::new(self.translator.clone(), target_language))
            .add_stage(SynthesizeStage::new(self.synthesizer.clone()))
            .add_stage(RemuxStage::new(
                self.media.clone(),
                video.to_path_buf(),
                dest,
            ))
            .stage_timeout(self.settings.stage_timeout())
            .build();

        let mut ctx = StageContext::new(run_id, self.work_dir.clone());
        let outcome = pipeline
            .run(Artifact::Video(video.to_path_buf()), &mut ctx)
            .await;
        let mut products = unpack(outcome)?;

        let translated_text = products.values.remove("translated_text").unwrap_or_default();
        let output_path = products.artifact.into_video()?;

        Ok(DubJob {
            translated_text,
            output_path,
        })
    }

    /// Translate text into the target language.
    pub async fn translate_text(&self, text: &str, target_language: &str) -> Result<TranslationJob> {
        let translated = self.translator.translate(text, target_language).await?;

        Ok(TranslationJob {
            original: text.to_string(),
            translated,
            target_language: target_language.to_string(),
        })
    }

    /// Summarize text, pivoting through English.
    ///
    /// Input in another language is translated to English first; the summary
    /// is translated back only when the requested output language differs
    /// from both English and the input language.
    #[instrument(skip(self, text), fields(input = %input_language, output = %output_language))]
    pub async fn summarize_text(
        &self,
        text: &str,
        input_language: &str,
        output_language: &str,
    ) -> Result<SummaryJob> {
        if text.trim().is_empty() {
            return Err(TolkError::InvalidInput(
                "Text to summarize cannot be empty".to_string(),
            ));
        }

        let min_chars = self.settings.summarization.min_input_chars;
        if text.chars().count() < min_chars {
            return Err(TolkError::InvalidInput(format!(
                "Input text is too short for meaningful summarization. \
                 Please provide at least {} characters.",
                min_chars
            )));
        }

        let plan = summary_plan(input_language, output_language);

        let processed = if plan.pivot_to_english {
            debug!("Translating input from {} to English", input_language);
            self.translator.translate(text, "en").await?
        } else {
            text.to_string()
        };

        if processed.split_whitespace().count() < MIN_SUMMARY_INPUT_WORDS {
            return Err(TolkError::InvalidInput(
                "Translated text is too short for meaningful summarization. \
                 Please provide more input."
                    .to_string(),
            ));
        }

        let english_summary = self.summarizer.summarize(&processed).await?;

        let summary = if plan.translate_summary {
            debug!("Translating summary from English to {}", output_language);
            self.translator
                .translate(&english_summary, output_language)
                .await?
        } else {
            english_summary.clone()
        };

        Ok(SummaryJob {
            original_text: text.to_string(),
            processed_text: processed,
            summary,
            english_summary,
            input_language: input_language.to_string(),
            output_language: output_language.to_string(),
        })
    }

    /// Probe a media file and reject it when it exceeds the duration limit.
    async fn check_duration(&self, path: &Path) -> Result<MediaInfo> {
        let info = self.media.probe(path).await?;
        let max = self.settings.transcription.max_duration_seconds;
        if info.duration_seconds > max as f64 {
            return Err(TolkError::InvalidInput(format!(
                "Media duration ({:.0} seconds) exceeds maximum ({} seconds)",
                info.duration_seconds, max
            )));
        }
        Ok(info)
    }

    /// Translate `text` to `target`, skipping the service call when the
    /// detected source language already matches.
    async fn translate_unless_already(
        &self,
        text: &str,
        source_language: Option<&str>,
        target: &str,
    ) -> Result<String> {
        let target_code = language_code(target);
        if target_code.is_some() && source_language.and_then(language_code) == target_code {
            return Ok(text.to_string());
        }
        self.translator.translate(text, target).await
    }
}

/// Successful pipeline products, with warnings already logged.
struct RunProducts {
    artifact: Artifact,
    values: HashMap<String, String>,
}

/// Turn a pipeline outcome into the run's products or the failing error.
fn unpack(outcome: PipelineOutcome) -> Result<RunProducts> {
    match outcome {
        PipelineOutcome::Success {
            artifact,
            values,
            reports,
            warnings,
            ..
        } => {
            for report in &reports {
                debug!("Stage '{}' took {:?}", report.stage, report.duration);
            }
            for warning in &warnings {
                warn!("{}", warning);
            }
            Ok(RunProducts { artifact, values })
        }
        PipelineOutcome::Failure {
            stage,
            error,
            warnings,
        } => {
            for warning in &warnings {
                warn!("{}", warning);
            }
            error!("Stage '{}' failed: {}", stage, error);
            Err(error)
        }
        PipelineOutcome::Cancelled { warnings } => {
            for warning in &warnings {
                warn!("{}", warning);
            }
            Err(TolkError::Cancelled)
        }
    }
}

/// File stem of `path`, or `fallback` when the path has none.
fn file_stem(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Result of transcribing an audio file.
#[derive(Debug)]
pub struct TranscriptionJob {
    /// Transcription in the language the model detected.
    pub transcription: String,
    /// The transcription translated to English.
    pub translation: String,
    /// Where the SRT file was written.
    pub subtitle_path: PathBuf,
}

/// Result of generating subtitles.
#[derive(Debug)]
pub struct SubtitleJob {
    /// Transcription in the language the model detected.
    pub transcription: String,
    /// Subtitle text in the requested language.
    pub subtitles: String,
    /// Where the SRT file was written. Always in the detected language.
    pub subtitle_path: PathBuf,
}

/// Result of dubbing a video.
#[derive(Debug)]
pub struct DubJob {
    /// The translated script the new soundtrack was synthesized from.
    pub translated_text: String,
    /// Where the dubbed video was written.
    pub output_path: PathBuf,
}

/// Result of translating text.
#[derive(Debug)]
pub struct TranslationJob {
    /// The input text.
    pub original: String,
    /// The translated text.
    pub translated: String,
    /// The language that was requested.
    pub target_language: String,
}

/// Result of summarizing text.
#[derive(Debug)]
pub struct SummaryJob {
    /// The input text.
    pub original_text: String,
    /// The text that was actually summarized (English).
    pub processed_text: String,
    /// The summary in the requested output language.
    pub summary: String,
    /// The summary before any back-translation.
    pub english_summary: String,
    /// Declared language of the input.
    pub input_language: String,
    /// Requested language of the summary.
    pub output_language: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::{Transcript, TranscriptSegment};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockMedia {
        duration: f64,
        extract_calls: Mutex<usize>,
        replace_limits: Mutex<Vec<f64>>,
    }

    impl MockMedia {
        fn with_duration(duration: f64) -> Self {
            Self {
                duration,
                extract_calls: Mutex::new(0),
                replace_limits: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaProcessor for MockMedia {
        async fn probe(&self, _path: &Path) -> Result<MediaInfo> {
            Ok(MediaInfo {
                duration_seconds: self.duration,
                has_audio: true,
                has_video: true,
            })
        }

        async fn extract_audio(&self, _source: &Path, _dest: &Path) -> Result<()> {
            *self.extract_calls.lock().unwrap() += 1;
            Ok(())
        }

        async fn replace_audio(
            &self,
            _video: &Path,
            _audio: &Path,
            _dest: &Path,
            duration_limit: f64,
        ) -> Result<()> {
            self.replace_limits.lock().unwrap().push(duration_limit);
            Ok(())
        }
    }

    struct MockTranscriber {
        text: String,
        language: Option<String>,
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Transcript> {
            Ok(Transcript::new(
                vec![TranscriptSegment::new(0.0, 12.0, self.text.clone())],
                self.language.clone(),
            ))
        }

        async fn transcribe_with_language(
            &self,
            audio_path: &Path,
            _language: &str,
        ) -> Result<Transcript> {
            self.transcribe(audio_path).await
        }
    }

    struct MockTranslator;

    #[async_trait]
    impl Translator for MockTranslator {
        async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
            let code = language_code(target_language)
                .ok_or_else(|| TolkError::UnsupportedLanguage(target_language.to_string()))?;
            Ok(format!("[{}] {}", code, text))
        }
    }

    struct MockSynthesizer {
        requests: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for MockSynthesizer {
        async fn synthesize(&self, text: &str, language: &str, _dest: &Path) -> Result<()> {
            self.requests
                .lock()
                .unwrap()
                .push((text.to_string(), language.to_string()));
            Ok(())
        }
    }

    struct MockSummarizer;

    #[async_trait]
    impl Summarizer for MockSummarizer {
        async fn summarize(&self, _text: &str) -> Result<String> {
            Ok("A short summary.".to_string())
        }
    }

    struct Fixture {
        orchestrator: Orchestrator,
        media: Arc<MockMedia>,
        synthesizer: Arc<MockSynthesizer>,
        _dir: tempfile::TempDir,
    }

    fn fixture(video_duration: f64, detected_language: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.work_dir = dir.path().join("work").display().to_string();
        settings.general.output_dir = dir.path().join("out").display().to_string();

        let media = Arc::new(MockMedia::with_duration(video_duration));
        let synthesizer = Arc::new(MockSynthesizer {
            requests: Mutex::new(Vec::new()),
        });
        let orchestrator = Orchestrator::with_components(
            settings,
            media.clone(),
            Arc::new(MockTranscriber {
                text: "Hello from the original soundtrack".to_string(),
                language: detected_language.map(|l| l.to_string()),
            }),
            Arc::new(MockTranslator),
            synthesizer.clone(),
            Arc::new(MockSummarizer),
        )
        .unwrap();

        Fixture {
            orchestrator,
            media,
            synthesizer,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_dub_video_truncates_to_video_duration() {
        let f = fixture(10.0, Some("english"));
        let video = f.orchestrator.work_dir.join("clip.mp4");

        let job = f.orchestrator.dub_video(&video, "fr").await.unwrap();

        assert_eq!(job.translated_text, "[fr] Hello from the original soundtrack");
        assert_eq!(
            job.output_path,
            f.orchestrator.output_dir.join("clip_translated.mp4")
        );
        // TTS audio may run long; the mux is always capped at the video's length.
        assert_eq!(*f.media.replace_limits.lock().unwrap(), vec![10.0]);

        let requests = f.synthesizer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, "fr");
    }

    #[tokio::test]
    async fn test_generate_subtitles_skips_extraction_for_audio() {
        let f = fixture(30.0, Some("english"));
        let audio = f.orchestrator.work_dir.join("talk.mp3");

        let job = f
            .orchestrator
            .generate_subtitles(&audio, "en")
            .await
            .unwrap();

        assert_eq!(*f.media.extract_calls.lock().unwrap(), 0);
        assert_eq!(job.transcription, "Hello from the original soundtrack");
        assert_eq!(job.subtitles, job.transcription);

        let srt = std::fs::read_to_string(&job.subtitle_path).unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:12,000"));
    }

    #[tokio::test]
    async fn test_generate_subtitles_translates_response_for_other_targets() {
        let f = fixture(30.0, Some("english"));
        let video = f.orchestrator.work_dir.join("talk.mp4");

        let job = f
            .orchestrator
            .generate_subtitles(&video, "es")
            .await
            .unwrap();

        assert_eq!(*f.media.extract_calls.lock().unwrap(), 1);
        assert_eq!(job.subtitles, "[es] Hello from the original soundtrack");
        // The SRT on disk stays in the detected language.
        let srt = std::fs::read_to_string(&job.subtitle_path).unwrap();
        assert!(srt.contains("Hello from the original soundtrack"));
    }

    #[tokio::test]
    async fn test_transcribe_audio_skips_translation_for_english_sources() {
        let f = fixture(30.0, Some("english"));
        let audio = f.orchestrator.work_dir.join("talk.mp3");

        let job = f.orchestrator.transcribe_audio(&audio).await.unwrap();

        assert_eq!(job.translation, job.transcription);
    }

    #[tokio::test]
    async fn test_rejects_media_over_duration_limit() {
        let f = fixture(8000.0, Some("english"));
        let video = f.orchestrator.work_dir.join("long.mp4");

        let err = f.orchestrator.dub_video(&video, "fr").await.unwrap_err();

        assert!(matches!(err, TolkError::InvalidInput(_)));
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[tokio::test]
    async fn test_summarize_keeps_english_summary_when_languages_match() {
        let f = fixture(10.0, None);
        let text = "Ceci est un long texte d'entree qui contient suffisamment de mots \
                    pour depasser les deux seuils de longueur imposes avant tout resume.";

        let job = f.orchestrator.summarize_text(text, "fr", "fr").await.unwrap();

        assert_eq!(job.processed_text, format!("[en] {}", text));
        // Back-translation is skipped when output matches the input language,
        // so the summary stays in English.
        assert_eq!(job.summary, "A short summary.");
        assert_eq!(job.english_summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_summarize_translates_summary_to_third_language() {
        let f = fixture(10.0, None);
        let text = "Ceci est un long texte d'entree qui contient suffisamment de mots \
                    pour depasser les deux seuils de longueur imposes avant tout resume.";

        let job = f.orchestrator.summarize_text(text, "fr", "es").await.unwrap();

        assert_eq!(job.summary, "[es] A short summary.");
        assert_eq!(job.english_summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_summarize_rejects_short_input() {
        let f = fixture(10.0, None);

        let err = f
            .orchestrator
            .summarize_text("Too short.", "en", "en")
            .await
            .unwrap_err();

        assert!(matches!(err, TolkError::InvalidInput(_)));
        assert!(err.to_string().contains("at least 100 characters"));
    }

    #[tokio::test]
    async fn test_summarize_rejects_sparse_input() {
        let f = fixture(10.0, None);
        // Over 100 characters but under 20 words.
        let text = "Antidisestablishmentarianism pseudopseudohypoparathyroidism \
                    floccinaucinihilipilification supercalifragilisticexpialidocious.";

        let err = f
            .orchestrator
            .summarize_text(text, "en", "en")
            .await
            .unwrap_err();

        assert!(matches!(err, TolkError::InvalidInput(_)));
        assert!(err.to_string().contains("too short for meaningful"));
    }
}
