//! Subtitles command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the subtitles command.
pub async fn run_subtitles(input: &str, language: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Subtitles) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tolk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let input_path = Path::new(input);
    if !input_path.exists() {
        Output::error(&format!("File not found: {}", input));
        return Err(anyhow::anyhow!("File not found: {}", input));
    }

    Output::info(&format!("Generating subtitles for: {}", input));

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Transcribing...");
    let job = match orchestrator.generate_subtitles(input_path, language).await {
        Ok(job) => {
            spinner.finish_and_clear();
            job
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate subtitles: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!("Subtitles written to {}", job.subtitle_path.display()));

    if job.subtitles != job.transcription {
        Output::header("Transcription");
        println!("{}", job.transcription);
        Output::header(&format!("Subtitle text ({})", language));
        println!("{}", job.subtitles);
    } else {
        Output::header("Transcription");
        println!("{}", job.transcription);
    }

    Ok(())
}
