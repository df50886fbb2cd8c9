//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(
    text: Option<String>,
    file: Option<String>,
    input_language: &str,
    output_language: &str,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Summarize) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tolk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let text = match (text, file) {
        (Some(_), Some(_)) => {
            return Err(anyhow::anyhow!("Pass either TEXT or --file, not both"));
        }
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Could not read {}: {}", path, e))?,
        (None, None) => {
            return Err(anyhow::anyhow!("Pass the text to summarize, or --file"));
        }
    };

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Summarizing...");
    let job = match orchestrator
        .summarize_text(&text, input_language, output_language)
        .await
    {
        Ok(job) => {
            spinner.finish_and_clear();
            job
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Summarization failed: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Summary");
    println!("{}", job.summary);

    if job.english_summary != job.summary {
        Output::header("English summary");
        println!("{}", job.english_summary);
    }

    Ok(())
}
