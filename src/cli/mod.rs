//! CLI module for Tolk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tolk - Media Transcription and Translation
///
/// Transcribe, translate, subtitle, and dub audio and video from the command
/// line or over HTTP. The name "Tolk" comes from the Norwegian word for
/// "interpreter."
#[derive(Parser, Debug)]
#[command(name = "tolk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Tolk and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Transcribe an audio or video file
    Transcribe {
        /// Local audio/video file path
        input: String,

        /// Language hint for the transcription model (ISO 639-1 code)
        #[arg(short, long)]
        language: Option<String>,

        /// Output file ("-" for stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (text, json, srt, vtt)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Generate an SRT subtitle file for an audio or video file
    Subtitles {
        /// Local audio/video file path
        input: String,

        /// Language for the subtitle text in the response (the SRT file
        /// stays in the detected language)
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// Dub a video into another language
    Dub {
        /// Local video file path
        input: String,

        /// Target language (ISO 639-1 code or English name)
        #[arg(short, long)]
        language: String,
    },

    /// Translate text into another language
    Translate {
        /// Text to translate (omit when using --file)
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<String>,

        /// Target language (defaults to the configured target)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Summarize text, pivoting through English
    Summarize {
        /// Text to summarize (omit when using --file)
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<String>,

        /// Language of the input text
        #[arg(long, default_value = "en")]
        input_language: String,

        /// Language for the summary
        #[arg(long, default_value = "en")]
        output_language: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "translation.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
