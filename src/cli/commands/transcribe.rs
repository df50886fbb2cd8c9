//! Transcribe command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::media::{is_video_file, FfmpegMediaProcessor, MediaProcessor};
use crate::transcription::{format_timestamp, format_transcript, OutputFormat, Transcriber, WhisperTranscriber};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the transcribe command.
pub async fn run_transcribe(
    input: &str,
    language: Option<String>,
    output: Option<String>,
    format: &str,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tolk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let input_path = Path::new(input);
    if !input_path.exists() {
        Output::error(&format!("File not found: {}", input));
        return Err(anyhow::anyhow!("File not found: {}", input));
    }

    // "text" is the human-readable default; everything else goes through
    // the structured formats.
    let output_format: Option<OutputFormat> = if format == "text" {
        None
    } else {
        Some(format.parse().map_err(|e: String| anyhow::anyhow!(e))?)
    };

    Output::info(&format!("Transcribing: {}", input));

    // Videos are transcribed from a temporary audio extraction.
    let scratch = tempfile::tempdir()?;
    let audio_path: PathBuf = if is_video_file(input_path) {
        let media = FfmpegMediaProcessor::new();
        let extracted = scratch.path().join("audio.mp3");

        let spinner = Output::spinner("Extracting audio...");
        media.extract_audio(input_path, &extracted).await?;
        spinner.finish_and_clear();

        extracted
    } else {
        input_path.to_path_buf()
    };

    let transcriber = WhisperTranscriber::with_config(
        &settings.transcription.model,
        settings.transcription.chunk_duration_seconds,
        settings.transcription.max_concurrent_chunks,
    )?;

    let spinner = Output::spinner("Transcribing...");
    let transcript = match &language {
        Some(lang) => transcriber.transcribe_with_language(&audio_path, lang).await?,
        None => transcriber.transcribe(&audio_path).await?,
    };
    spinner.finish_and_clear();

    Output::success(&format!(
        "Transcribed {} segments ({})",
        transcript.segments.len(),
        format_timestamp(transcript.duration_seconds)
    ));
    if let Some(detected) = &transcript.language {
        Output::kv("Language", detected);
    }

    let output_str = match output_format {
        Some(fmt) => format_transcript(&transcript, fmt),
        None => transcript.format_with_timestamps(),
    };

    match output.as_deref() {
        None | Some("-") => {
            println!();
            println!("{}", output_str);
        }
        Some(path) => {
            std::fs::write(path, &output_str)?;
            Output::success(&format!(
                "Transcript saved to {} ({} segments)",
                path,
                transcript.segments.len()
            ));
        }
    }

    Ok(())
}
