//! Configuration module for Tolk.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    GeneralSettings, PipelineSettings, ServerSettings, Settings, SummarizationSettings,
    SynthesisSettings, TranscriptionSettings, TranslationSettings,
};
