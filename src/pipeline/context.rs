//! Per-run state shared with every stage.

use super::resource::{Resource, TempFile};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mutable run state handed to each stage in turn.
///
/// Carries the run identity, the scratch directory, the teardown stack, and
/// the run's declared outputs. Stage-to-stage data travels in artifacts, not
/// here; the string values are for reporting back to the caller only.
pub struct StageContext {
    run_id: String,
    work_dir: PathBuf,
    teardown: Vec<Box<dyn Resource>>,
    outputs: Vec<PathBuf>,
    values: HashMap<String, String>,
}

impl StageContext {
    /// Create a context for one run. The run id must be unique per run;
    /// it namespaces every scratch path this context hands out.
    pub fn new(run_id: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: run_id.into(),
            work_dir: work_dir.into(),
            teardown: Vec::new(),
            outputs: Vec::new(),
            values: HashMap::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// A scratch path unique to this run.
    pub fn scratch_path(&self, suffix: &str) -> PathBuf {
        self.work_dir.join(format!("{}-{}", self.run_id, suffix))
    }

    /// Register an arbitrary resource for teardown.
    pub fn register(&mut self, resource: Box<dyn Resource>) {
        self.teardown.push(resource);
    }

    /// Register a scratch file for deletion on teardown. Call this the
    /// moment the path is chosen, before writing to it.
    pub fn register_temp_file(&mut self, path: PathBuf) {
        self.register(Box::new(TempFile::new(path)));
    }

    /// Declare a file that outlives the run (a product, not scratch).
    pub fn declare_output(&mut self, path: PathBuf) {
        self.outputs.push(path);
    }

    /// Record a string for the run report (e.g. the translated text).
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    /// Number of resources currently awaiting teardown.
    pub fn pending_resources(&self) -> usize {
        self.teardown.len()
    }

    pub(crate) fn drain_teardown(&mut self) -> Vec<Box<dyn Resource>> {
        std::mem::take(&mut self.teardown)
    }

    pub(crate) fn take_outputs(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.outputs)
    }

    pub(crate) fn take_values(&mut self) -> HashMap<String, String> {
        std::mem::take(&mut self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_path_is_namespaced_by_run() {
        let a = StageContext::new("run-a", "/tmp/work");
        let b = StageContext::new("run-b", "/tmp/work");
        assert_ne!(a.scratch_path("audio.mp3"), b.scratch_path("audio.mp3"));
        assert!(a
            .scratch_path("audio.mp3")
            .to_string_lossy()
            .contains("run-a"));
    }

    #[test]
    fn test_values_round_trip() {
        let mut ctx = StageContext::new("run", "/tmp/work");
        ctx.set_value("translated_text", "hallo");
        assert_eq!(ctx.value("translated_text"), Some("hallo"));
        assert_eq!(ctx.value("missing"), None);
    }

    #[test]
    fn test_registered_resources_are_counted() {
        let mut ctx = StageContext::new("run", "/tmp/work");
        assert_eq!(ctx.pending_resources(), 0);
        ctx.register_temp_file(PathBuf::from("/tmp/work/run-a.mp3"));
        ctx.register_temp_file(PathBuf::from("/tmp/work/run-b.mp3"));
        assert_eq!(ctx.pending_resources(), 2);
    }
}
