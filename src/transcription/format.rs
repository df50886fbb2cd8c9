//! Transcript output formatting (JSON, SRT, VTT).
//!
//! SRT is the primary format: downstream subtitle consumers depend on the
//! exact entry layout, so it is preserved byte-for-byte across calls.

use super::Transcript;
use serde::Serialize;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Srt,
    Vtt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use json, srt, or vtt.", s)),
        }
    }
}

/// JSON-serializable transcript for export.
#[derive(Debug, Serialize)]
pub struct TranscriptExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub duration_seconds: f64,
    pub segments: Vec<SegmentExport>,
}

#[derive(Debug, Serialize)]
pub struct SegmentExport {
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl From<&Transcript> for TranscriptExport {
    fn from(transcript: &Transcript) -> Self {
        Self {
            language: transcript.language.clone(),
            duration_seconds: transcript.duration_seconds,
            segments: transcript
                .segments
                .iter()
                .map(|s| SegmentExport {
                    text: s.text.clone(),
                    start_seconds: s.start_seconds,
                    end_seconds: s.end_seconds,
                })
                .collect(),
        }
    }
}

/// Format a transcript for output.
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(transcript),
        OutputFormat::Srt => format_srt(transcript),
        OutputFormat::Vtt => format_vtt(transcript),
    }
}

/// Format as JSON.
fn format_json(transcript: &Transcript) -> String {
    let export = TranscriptExport::from(transcript);
    serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string())
}

/// Format as SRT (SubRip): 1-based index, `HH:MM:SS,mmm --> HH:MM:SS,mmm`
/// range, trimmed caption text, entries separated by a blank line.
pub fn format_srt(transcript: &Transcript) -> String {
    let mut output = String::new();

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(segment.start_seconds),
            format_srt_timestamp(segment.end_seconds)
        ));
        output.push_str(segment.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Format as WebVTT.
pub fn format_vtt(transcript: &Transcript) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_timestamp(segment.start_seconds),
            format_vtt_timestamp(segment.end_seconds)
        ));
        output.push_str(segment.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}

/// Format timestamp for VTT (00:00:00.000).
fn format_vtt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptSegment;

    fn sample_transcript() -> Transcript {
        Transcript::new(
            vec![
                TranscriptSegment::new(0.0, 2.5, "Hello world.".to_string()),
                TranscriptSegment::new(2.5, 5.0, "This is a test.".to_string()),
            ],
            Some("english".to_string()),
        )
    }

    #[test]
    fn test_format_json() {
        let transcript = sample_transcript();
        let json = format_transcript(&transcript, OutputFormat::Json);
        assert!(json.contains("\"language\": \"english\""));
        assert!(json.contains("Hello world."));
    }

    #[test]
    fn test_format_srt() {
        let transcript = sample_transcript();
        let srt = format_transcript(&transcript, OutputFormat::Srt);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world.\n\n"));
        assert!(srt.contains("2\n00:00:02,500 --> 00:00:05,000\nThis is a test.\n\n"));
    }

    #[test]
    fn test_format_srt_entries_are_blank_line_separated() {
        let srt = format_srt(&sample_transcript());
        let entries: Vec<&str> = srt.trim_end().split("\n\n").collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].starts_with("1\n"));
        assert!(entries[1].starts_with("2\n"));
    }

    #[test]
    fn test_format_srt_is_idempotent() {
        let transcript = sample_transcript();
        let first = format_srt(&transcript);
        let second = format_srt(&transcript);
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_vtt() {
        let transcript = sample_transcript();
        let vtt = format_transcript(&transcript, OutputFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.500"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("srt".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("vtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert_eq!("webvtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3661.123), "01:01:01,123");
        assert_eq!(format_srt_timestamp(3661.234), "01:01:01,234");
    }
}
