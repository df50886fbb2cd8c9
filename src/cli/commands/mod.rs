//! CLI command implementations.

mod config;
mod doctor;
mod dub;
mod init;
mod serve;
mod subtitles;
mod summarize;
mod transcribe;
mod translate;

pub use config::run_config;
pub use doctor::run_doctor;
pub use dub::run_dub;
pub use init::run_init;
pub use serve::run_serve;
pub use subtitles::run_subtitles;
pub use summarize::run_summarize;
pub use transcribe::run_transcribe;
pub use translate::run_translate;
