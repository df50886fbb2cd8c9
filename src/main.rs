//! Tolk CLI entry point.

use anyhow::Result;
use clap::Parser;
use tolk::cli::{commands, Cli, Commands};
use tolk::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tolk={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure working directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.work_dir())?;
    std::fs::create_dir_all(settings.output_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Transcribe {
            input,
            language,
            output,
            format,
        } => {
            commands::run_transcribe(input, language.clone(), output.clone(), format, settings)
                .await?;
        }

        Commands::Subtitles { input, language } => {
            commands::run_subtitles(input, language, settings).await?;
        }

        Commands::Dub { input, language } => {
            commands::run_dub(input, language, settings).await?;
        }

        Commands::Translate {
            text,
            file,
            language,
        } => {
            commands::run_translate(text.clone(), file.clone(), language.clone(), settings).await?;
        }

        Commands::Summarize {
            text,
            file,
            input_language,
            output_language,
        } => {
            commands::run_summarize(
                text.clone(),
                file.clone(),
                input_language,
                output_language,
                settings,
            )
            .await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
