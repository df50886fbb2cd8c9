//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::error::{Result, TolkError};
use crate::media::split_audio;
use crate::openai::{create_client, require_api_key};
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config("whisper-1", 120, 3)
    }

    /// Create a new Whisper transcriber with custom configuration.
    ///
    /// Fails with `ModelUnavailable` when no API credentials are present.
    pub fn with_config(
        model: &str,
        chunk_duration_seconds: u32,
        max_concurrent_chunks: usize,
    ) -> Result<Self> {
        require_api_key()?;

        Ok(Self {
            client: create_client(),
            model: model.to_string(),
            chunk_duration_seconds,
            max_concurrent_chunks,
        })
    }

    /// Transcribe a single audio file (no splitting).
    ///
    /// Returns the segments and the language the model reported.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<(Vec<TranscriptSegment>, Option<String>)> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| TolkError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| TolkError::Transcription(format!("Whisper API error: {}", e)))?;

        let reported_language = if response.language.is_empty() {
            None
        } else {
            Some(response.language.to_lowercase())
        };

        let segments: Vec<TranscriptSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| {
                        TranscriptSegment::new(s.start as f64, s.end as f64, s.text.clone())
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                // Fallback: single segment covering the full response
                vec![TranscriptSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.clone(),
                )]
            });

        debug!("Transcribed {} segments", segments.len());
        Ok((segments, reported_language))
    }

    /// Transcribe an audio file, splitting long audio into chunks.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_with_splitting(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<Transcript> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if chunks.len() == 1 {
            let (segments, reported) = self.transcribe_single(audio_path, language).await?;
            return Ok(Transcript::new(segments, reported));
        }

        let chunk_count = chunks.len();
        info!("Processing {} audio chunks with {}", chunk_count, self.model);

        let pb = Arc::new(ProgressBar::new(chunk_count as u64));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        // Process chunks in parallel with concurrency limit, fail fast on error
        let mut results: Vec<(usize, f64, Vec<TranscriptSegment>, Option<String>)> =
            Vec::with_capacity(chunk_count);

        let mut stream = stream::iter(chunks.into_iter().enumerate())
            .map(|(idx, (chunk_path, time_offset))| {
                let language = language.map(|s| s.to_string());
                async move {
                    let result = self.transcribe_single(&chunk_path, language.as_deref()).await;
                    (idx, time_offset, result)
                }
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, time_offset, result)) = stream.next().await {
            pb.inc(1);
            match result {
                Ok((segments, reported)) => results.push((idx, time_offset, segments, reported)),
                Err(e) => {
                    pb.finish_and_clear();
                    drop(temp_dir);
                    return Err(TolkError::Transcription(format!(
                        "Chunk {} at {:.0}s failed: {}",
                        idx, time_offset, e
                    )));
                }
            }
        }

        pb.finish_and_clear();

        // Sort by chunk index and merge, shifting each chunk's timestamps
        results.sort_by_key(|(idx, _, _, _)| *idx);

        let reported_language = results.iter().find_map(|(_, _, _, lang)| lang.clone());

        let mut all_segments = Vec::new();
        for (_, time_offset, mut segments, _) in results {
            for segment in &mut segments {
                segment.start_seconds += time_offset;
                segment.end_seconds += time_offset;
            }
            all_segments.extend(segments);
        }

        drop(temp_dir);

        Ok(Transcript::new(all_segments, reported_language))
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        self.transcribe_with_splitting(audio_path, None).await
    }

    async fn transcribe_with_language(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Transcript> {
        self.transcribe_with_splitting(audio_path, Some(language)).await
    }
}
