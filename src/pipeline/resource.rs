//! Resource handles tracked by a pipeline run's teardown stack.

use std::path::PathBuf;

/// A resource acquired during a run that must be released when the run ends.
pub trait Resource: Send {
    /// Human-readable identity for logs and warnings.
    fn describe(&self) -> String;

    /// Release the resource. Called exactly once by the runner.
    fn release(&mut self) -> std::io::Result<()>;
}

/// A scratch file owned by the run and deleted on teardown.
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Resource for TempFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn release(&mut self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            // A registered path the stage never got around to creating is fine.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// A non-fatal release failure collected during teardown.
///
/// These ride along on the run's terminal outcome and never replace it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWarning {
    pub resource: String,
    pub message: String,
}

impl std::fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to release {}: {}", self.resource, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_file_release_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.bin");
        std::fs::write(&path, b"data").unwrap();

        let mut resource = TempFile::new(path.clone());
        resource.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_release_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut resource = TempFile::new(dir.path().join("never-created.bin"));
        assert!(resource.release().is_ok());
    }

    #[test]
    fn test_release_warning_display() {
        let warning = ReleaseWarning {
            resource: "/tmp/x".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "failed to release /tmp/x: permission denied"
        );
    }
}
