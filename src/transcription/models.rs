//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// A complete transcript with time-aligned segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Individual transcript segments, time-ordered and non-overlapping.
    pub segments: Vec<TranscriptSegment>,
    /// Full transcript text (concatenated segments).
    pub full_text: String,
    /// Total duration in seconds.
    pub duration_seconds: f64,
    /// Language reported by the model (ISO code or English name), if any.
    pub language: Option<String>,
}

impl Transcript {
    /// Build a transcript from raw model segments, normalizing them.
    ///
    /// Whitespace-only segments are dropped, text is trimmed, negative times
    /// are clamped to zero, segments are sorted by start time, and overlaps
    /// are clamped forward so the sequence stays disjoint.
    pub fn new(segments: Vec<TranscriptSegment>, language: Option<String>) -> Self {
        let mut segments: Vec<TranscriptSegment> = segments
            .into_iter()
            .filter_map(|s| {
                let text = s.text.trim().to_string();
                if text.is_empty() {
                    return None;
                }
                // f64::max ignores NaN, so NaN times collapse to the bound.
                let start = s.start_seconds.max(0.0);
                let end = s.end_seconds.max(start);
                Some(TranscriptSegment {
                    start_seconds: start,
                    end_seconds: end,
                    text,
                })
            })
            .collect();

        segments.sort_by(|a, b| {
            a.start_seconds
                .partial_cmp(&b.start_seconds)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut prev_end = 0.0_f64;
        for segment in &mut segments {
            if segment.start_seconds < prev_end {
                segment.start_seconds = prev_end;
            }
            if segment.end_seconds < segment.start_seconds {
                segment.end_seconds = segment.start_seconds;
            }
            prev_end = segment.end_seconds;
        }

        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let duration_seconds = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);

        Self {
            segments,
            full_text,
            duration_seconds,
            language,
        }
    }

    /// Format the transcript with timestamps for display.
    pub fn format_with_timestamps(&self) -> String {
        self.segments
            .iter()
            .map(|s| {
                format!(
                    "[{} - {}] {}",
                    format_timestamp(s.start_seconds),
                    format_timestamp(s.end_seconds),
                    s.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_creation() {
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "Hello world".to_string()),
            TranscriptSegment::new(5.0, 10.0, "This is a test".to_string()),
        ];

        let transcript = Transcript::new(segments, Some("english".to_string()));

        assert_eq!(transcript.full_text, "Hello world This is a test");
        assert_eq!(transcript.duration_seconds, 10.0);
        assert_eq!(transcript.language.as_deref(), Some("english"));
    }

    #[test]
    fn test_new_drops_empty_segments_and_trims() {
        let segments = vec![
            TranscriptSegment::new(0.0, 1.0, "  Hello  ".to_string()),
            TranscriptSegment::new(1.0, 2.0, "   ".to_string()),
            TranscriptSegment::new(2.0, 3.0, "".to_string()),
        ];

        let transcript = Transcript::new(segments, None);

        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].text, "Hello");
    }

    #[test]
    fn test_new_clamps_negative_times() {
        let segments = vec![TranscriptSegment::new(-1.5, 2.0, "early".to_string())];
        let transcript = Transcript::new(segments, None);
        assert_eq!(transcript.segments[0].start_seconds, 0.0);
        assert_eq!(transcript.segments[0].end_seconds, 2.0);
    }

    #[test]
    fn test_new_clamps_inverted_times() {
        let segments = vec![TranscriptSegment::new(5.0, 3.0, "backwards".to_string())];
        let transcript = Transcript::new(segments, None);
        assert_eq!(transcript.segments[0].start_seconds, 5.0);
        assert_eq!(transcript.segments[0].end_seconds, 5.0);
    }

    #[test]
    fn test_new_sorts_and_clamps_overlaps() {
        let segments = vec![
            TranscriptSegment::new(4.0, 8.0, "second".to_string()),
            TranscriptSegment::new(0.0, 5.0, "first".to_string()),
        ];

        let transcript = Transcript::new(segments, None);

        assert_eq!(transcript.segments[0].text, "first");
        assert_eq!(transcript.segments[1].text, "second");
        // Overlapping start is pushed to the previous end.
        assert_eq!(transcript.segments[1].start_seconds, 5.0);
        assert_eq!(transcript.segments[1].end_seconds, 8.0);
        // Sequence is disjoint and ordered.
        for pair in transcript.segments.windows(2) {
            assert!(pair[0].end_seconds <= pair[1].start_seconds);
        }
    }

    #[test]
    fn test_empty_transcript() {
        let transcript = Transcript::new(Vec::new(), None);
        assert!(transcript.segments.is_empty());
        assert_eq!(transcript.full_text, "");
        assert_eq!(transcript.duration_seconds, 0.0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
    }

    #[test]
    fn test_segment_duration() {
        let segment = TranscriptSegment::new(1.5, 4.0, "x".to_string());
        assert_eq!(segment.duration(), 2.5);
    }
}
