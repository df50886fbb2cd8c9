//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::error::{Result, TolkError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Media jobs need ffmpeg/ffprobe and an API key.
    Transcribe,
    Subtitles,
    Dub,
    /// Text jobs only need an API key.
    Translate,
    Summarize,
    /// The server runs every kind of job.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Transcribe | Operation::Subtitles | Operation::Dub | Operation::Serve => {
            check_api_key()?;
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
        Operation::Translate | Operation::Summarize => {
            check_api_key()?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(TolkError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(TolkError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(TolkError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TolkError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(TolkError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_reports_tool_not_found() {
        let err = check_tool("tolk-no-such-tool").unwrap_err();
        assert!(matches!(err, TolkError::ToolNotFound(_)));
    }
}
