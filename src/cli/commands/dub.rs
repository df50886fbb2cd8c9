//! Dub command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::media::is_video_file;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the dub command.
pub async fn run_dub(input: &str, language: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Dub) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tolk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let input_path = Path::new(input);
    if !input_path.exists() {
        Output::error(&format!("File not found: {}", input));
        return Err(anyhow::anyhow!("File not found: {}", input));
    }
    if !is_video_file(input_path) {
        Output::error("Dubbing needs a video file (mp4, mkv, webm, ...)");
        return Err(anyhow::anyhow!("Not a video file: {}", input));
    }

    Output::info(&format!("Dubbing {} into '{}'", input, language));

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Transcribing, translating, and synthesizing...");
    let job = match orchestrator.dub_video(input_path, language).await {
        Ok(job) => {
            spinner.finish_and_clear();
            job
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Dubbing failed: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!("Dubbed video written to {}", job.output_path.display()));
    Output::header("Translated script");
    println!("{}", job.translated_text);

    Ok(())
}
