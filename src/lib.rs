//! Tolk - Media Transcription and Translation
//!
//! A CLI tool and HTTP service for transcribing, translating, subtitling, and
//! dubbing audio and video.
//!
//! The name "Tolk" comes from the Norwegian word for "interpreter."
//!
//! # Overview
//!
//! Tolk allows you to:
//! - Transcribe local audio/video files with timestamped segments
//! - Generate SRT subtitle files in the detected language
//! - Translate transcripts and freeform text between languages
//! - Dub a video by synthesizing translated speech and remuxing it
//! - Summarize long text, pivoting through English
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `media` - ffmpeg-backed probing, extraction, and remuxing
//! - `transcription` - Speech-to-text transcription
//! - `translation` - Text translation
//! - `synthesis` - Text-to-speech synthesis
//! - `summarize` - Text summarization
//! - `pipeline` - Staged runs with scratch-file cleanup
//! - `orchestrator` - Job coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use tolk::config::Settings;
//! use tolk::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Dub a video into French
//!     let job = orchestrator.dub_video("talk.mp4".as_ref(), "fr").await?;
//!     println!("Dubbed video at {}", job.output_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod summarize;
pub mod synthesis;
pub mod transcription;
pub mod translation;

pub use error::{Result, TolkError};
