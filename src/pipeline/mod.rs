//! Pipeline module for Tolk.
//!
//! A pipeline is an ordered list of stages run by a single runner. Each stage
//! takes the previous stage's artifact and produces the next one. Resources
//! allocated along the way (scratch files, handles) are registered with the
//! run's teardown stack and released in reverse order when the run ends,
//! whether it succeeded, failed, timed out, or was cancelled.

mod artifact;
mod cancel;
mod context;
mod resource;
mod runner;
pub mod stages;

pub use artifact::{Artifact, SubtitleFile, TranslatedText};
pub use cancel::CancellationToken;
pub use context::StageContext;
pub use resource::{ReleaseWarning, Resource, TempFile};
pub use runner::{Pipeline, PipelineBuilder, PipelineOutcome, StageReport};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for pipeline stages.
///
/// A stage consumes the current artifact and produces the next one. Anything
/// it allocates must be registered with the context the moment it picks the
/// path, so the runner can release it no matter where the run stops.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name for logging and failure reporting.
    fn name(&self) -> &str;

    /// Run this stage's transformation.
    async fn execute(&self, input: Artifact, ctx: &mut StageContext) -> Result<Artifact>;

    /// Per-stage timeout override. `None` uses the pipeline default.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}
