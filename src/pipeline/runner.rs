//! Sequential pipeline runner with guaranteed teardown.

use super::artifact::Artifact;
use super::cancel::CancellationToken;
use super::context::StageContext;
use super::resource::ReleaseWarning;
use super::Stage;
use crate::error::TolkError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default per-stage timeout when the builder does not set one.
const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Timing record for one completed stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: String,
    pub duration: Duration,
}

/// Terminal outcome of a pipeline run.
///
/// Every variant carries the release warnings collected during teardown.
/// A release failure never replaces the run's own result.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// All stages completed.
    Success {
        artifact: Artifact,
        outputs: Vec<PathBuf>,
        values: HashMap<String, String>,
        reports: Vec<StageReport>,
        warnings: Vec<ReleaseWarning>,
    },
    /// A stage failed or timed out; later stages never ran.
    Failure {
        stage: String,
        error: TolkError,
        warnings: Vec<ReleaseWarning>,
    },
    /// The run was cancelled before it could finish.
    Cancelled { warnings: Vec<ReleaseWarning> },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success { .. })
    }

    pub fn warnings(&self) -> &[ReleaseWarning] {
        match self {
            PipelineOutcome::Success { warnings, .. }
            | PipelineOutcome::Failure { warnings, .. }
            | PipelineOutcome::Cancelled { warnings } => warnings,
        }
    }
}

/// An ordered list of stages executed by one runner.
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    stage_timeout: Duration,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run to completion without external cancellation.
    pub async fn run(&self, initial: Artifact, ctx: &mut StageContext) -> PipelineOutcome {
        self.run_with_cancellation(initial, ctx, &CancellationToken::new())
            .await
    }

    /// Run to completion, stopping early if `token` is cancelled.
    ///
    /// Teardown always runs: every resource registered before the stop point
    /// is released in reverse acquisition order, exactly once, whether the
    /// run succeeded, failed, timed out, or was cancelled.
    pub async fn run_with_cancellation(
        &self,
        initial: Artifact,
        ctx: &mut StageContext,
        token: &CancellationToken,
    ) -> PipelineOutcome {
        info!(
            "Starting pipeline '{}' ({} stages, run {})",
            self.name,
            self.stages.len(),
            ctx.run_id()
        );

        let mut reports = Vec::with_capacity(self.stages.len());
        let mut artifact = initial;

        for (index, stage) in self.stages.iter().enumerate() {
            if token.is_cancelled() {
                warn!(
                    "Run {} cancelled before stage '{}'",
                    ctx.run_id(),
                    stage.name()
                );
                return PipelineOutcome::Cancelled {
                    warnings: release_all(ctx),
                };
            }

            let timeout = stage.timeout().unwrap_or(self.stage_timeout);
            debug!(
                "Stage {}/{}: '{}' (input: {}, timeout {:?})",
                index + 1,
                self.stages.len(),
                stage.name(),
                artifact.kind(),
                timeout
            );
            let started = Instant::now();

            let waited = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = tokio::time::timeout(timeout, stage.execute(artifact, ctx)) => Some(result),
            };

            match waited {
                None => {
                    warn!(
                        "Run {} cancelled during stage '{}'",
                        ctx.run_id(),
                        stage.name()
                    );
                    return PipelineOutcome::Cancelled {
                        warnings: release_all(ctx),
                    };
                }
                Some(Err(_elapsed)) => {
                    error!("Stage '{}' timed out after {:?}", stage.name(), timeout);
                    return PipelineOutcome::Failure {
                        stage: stage.name().to_string(),
                        error: TolkError::StageTimeout(timeout),
                        warnings: release_all(ctx),
                    };
                }
                Some(Ok(Err(e))) => {
                    error!("Stage '{}' failed: {}", stage.name(), e);
                    return PipelineOutcome::Failure {
                        stage: stage.name().to_string(),
                        error: e,
                        warnings: release_all(ctx),
                    };
                }
                Some(Ok(Ok(output))) => {
                    let duration = started.elapsed();
                    debug!(
                        "Stage '{}' completed in {:.2}s",
                        stage.name(),
                        duration.as_secs_f64()
                    );
                    reports.push(StageReport {
                        stage: stage.name().to_string(),
                        duration,
                    });
                    artifact = output;
                }
            }
        }

        let warnings = release_all(ctx);
        info!("Pipeline '{}' completed (run {})", self.name, ctx.run_id());
        PipelineOutcome::Success {
            artifact,
            outputs: ctx.take_outputs(),
            values: ctx.take_values(),
            reports,
            warnings,
        }
    }
}

/// Release the teardown stack in reverse acquisition order.
///
/// Failures are collected as warnings; a failed release never aborts the
/// remaining releases.
fn release_all(ctx: &mut StageContext) -> Vec<ReleaseWarning> {
    let mut stack = ctx.drain_teardown();
    let mut warnings = Vec::new();
    while let Some(mut resource) = stack.pop() {
        if let Err(e) = resource.release() {
            warn!("Failed to release {}: {}", resource.describe(), e);
            warnings.push(ReleaseWarning {
                resource: resource.describe(),
                message: e.to_string(),
            });
        }
    }
    warnings
}

/// Builder for constructing pipelines.
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    stage_timeout: Duration,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    /// Add a stage to the pipeline.
    pub fn add_stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a boxed stage to the pipeline.
    pub fn add_boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Set the default per-stage timeout.
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            stages: self.stages,
            stage_timeout: self.stage_timeout,
        }
    }
}
