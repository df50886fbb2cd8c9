//! Media probing and transformation via ffmpeg/ffprobe.
//!
//! Everything here shells out to the ffmpeg tools; nothing decodes media
//! in-process.

use crate::error::{Result, TolkError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "opus", "m4a", "wma", "aiff", "alac",
];

/// Supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "m4v", "mpeg", "mpg", "3gp",
];

/// Check if path has a supported audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Check if path has a supported video extension.
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check if path is a supported media file (audio or video).
pub fn is_media_file(path: &Path) -> bool {
    is_audio_file(path) || is_video_file(path)
}

fn has_extension(path: &Path, table: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| table.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Container facts the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub duration_seconds: f64,
    pub has_audio: bool,
    pub has_video: bool,
}

/// Trait for media container operations.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Read duration and stream layout of a media file.
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Extract the audio track of `source` into an MP3 at `dest`.
    async fn extract_audio(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Write `video` with its audio track replaced by `audio` to `dest`.
    ///
    /// The output is capped at `duration_limit` seconds: replacement audio
    /// longer than the video is truncated, shorter audio is left as-is with
    /// no looping or silence padding.
    async fn replace_audio(
        &self,
        video: &Path,
        audio: &Path,
        dest: &Path,
        duration_limit: f64,
    ) -> Result<()>;
}

/// ffmpeg/ffprobe-backed media processor.
pub struct FfmpegMediaProcessor;

impl FfmpegMediaProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegMediaProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an external tool invocation. The child is killed when its future
/// is dropped, which is what happens on a stage timeout or cancellation.
fn command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.kill_on_drop(true);
    cmd
}

#[async_trait]
impl MediaProcessor for FfmpegMediaProcessor {
    #[instrument(skip(self))]
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let result = command("ffprobe")
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(path)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TolkError::ToolNotFound("ffprobe".into()));
            }
            Err(e) => {
                return Err(TolkError::Media(format!("ffprobe execution failed: {e}")));
            }
        };

        if !output.status.success() {
            return Err(TolkError::Media(format!(
                "ffprobe could not read {}",
                path.display()
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    #[instrument(skip(self))]
    async fn extract_audio(&self, source: &Path, dest: &Path) -> Result<()> {
        let info = self.probe(source).await?;
        if !info.has_audio {
            return Err(TolkError::Media(format!(
                "{} has no audio track",
                source.display()
            )));
        }

        debug!("Extracting audio track to {:?}", dest);

        let result = command("ffmpeg")
            .arg("-i").arg(source)
            .arg("-vn")
            .arg("-codec:a").arg("libmp3lame")
            .arg("-qscale:a").arg("2")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(TolkError::Media(format!("Audio extraction failed: {err}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TolkError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(TolkError::Media(format!("ffmpeg error: {e}"))),
        }
    }

    #[instrument(skip(self))]
    async fn replace_audio(
        &self,
        video: &Path,
        audio: &Path,
        dest: &Path,
        duration_limit: f64,
    ) -> Result<()> {
        debug!(
            "Replacing audio track, output capped at {:.3}s",
            duration_limit
        );

        // First attempt: copy the video stream untouched.
        let copy_result = mux_command(video, audio, dest, duration_limit, true)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match copy_result {
            Ok(status) if status.success() && dest.exists() => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TolkError::ToolNotFound("ffmpeg".into()));
            }
            _ => {}
        }

        // Fallback: re-encode the video stream.
        warn!("Stream copy failed, re-encoding video");

        let encode_result = mux_command(video, audio, dest, duration_limit, false)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match encode_result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(TolkError::Media(format!("Audio replacement failed: {err}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TolkError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(TolkError::Media(format!("ffmpeg error: {e}"))),
        }
    }
}

/// Segments a long audio file into smaller chunks for processing.
///
/// Each chunk is approximately `chunk_seconds` long. Returns tuples of
/// (chunk_path, offset_seconds). Short audio comes back as a single entry
/// pointing at the source itself.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(std::path::PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = FfmpegMediaProcessor::new().probe(source).await?.duration_seconds;
    debug!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds as f64;

    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let segment_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        let segment_len = chunk_len.min(total_duration - offset);

        extract_segment(source, &segment_path, offset, segment_len).await?;

        segments.push((segment_path, offset));
        offset += chunk_len;
        idx += 1;
    }

    debug!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    // First attempt: stream copy (fast, no quality loss)
    let copy_result = command("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    // Fallback: re-encode to MP3
    warn!("Stream copy failed, re-encoding segment");

    let encode_result = command("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(TolkError::Media(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TolkError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(TolkError::Media(format!("ffmpeg error: {e}"))),
    }
}

/// Build the remux invocation. `-t` enforces the duration cap; without
/// `-shortest`, audio that ends early simply runs out.
fn mux_command(
    video: &Path,
    audio: &Path,
    dest: &Path,
    duration_limit: f64,
    copy_video: bool,
) -> Command {
    let mut cmd = command("ffmpeg");
    cmd.arg("-i").arg(video)
        .arg("-i").arg(audio)
        .arg("-map").arg("0:v:0")
        .arg("-map").arg("1:a:0");

    if copy_video {
        cmd.arg("-c:v").arg("copy");
    } else {
        cmd.arg("-c:v").arg("libx264").arg("-preset").arg("veryfast");
    }

    cmd.arg("-c:a").arg("aac")
        .arg("-t").arg(format!("{:.3}", duration_limit))
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest);
    cmd
}

/// Parse ffprobe JSON into [`MediaInfo`].
fn parse_probe_output(json_str: &str) -> Result<MediaInfo> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| TolkError::Media("Invalid ffprobe output".into()))?;

    let duration_seconds = parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| TolkError::Media("Could not determine media duration".into()))?;

    let mut has_audio = false;
    let mut has_video = false;
    if let Some(streams) = parsed["streams"].as_array() {
        for stream in streams {
            match stream["codec_type"].as_str() {
                Some("audio") => has_audio = true,
                Some("video") => has_video = true,
                _ => {}
            }
        }
    }

    Ok(MediaInfo {
        duration_seconds,
        has_audio,
        has_video,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("audio.mp3")));
        assert!(is_audio_file(Path::new("audio.WAV")));
        assert!(is_audio_file(Path::new("/path/to/audio.flac")));
        assert!(!is_audio_file(Path::new("video.mp4")));
        assert!(!is_audio_file(Path::new("document.pdf")));
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("video.mp4")));
        assert!(is_video_file(Path::new("video.MKV")));
        assert!(!is_video_file(Path::new("audio.mp3")));
    }

    #[test]
    fn test_is_media_file() {
        assert!(is_media_file(Path::new("video.mp4")));
        assert!(is_media_file(Path::new("audio.mp3")));
        assert!(!is_media_file(Path::new("document.pdf")));
        assert!(!is_media_file(Path::new("no_extension")));
    }

    #[test]
    fn test_parse_probe_output_reads_streams_and_duration() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264"},
                {"codec_type": "audio", "codec_name": "aac"}
            ],
            "format": {"duration": "10.500000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration_seconds, 10.5);
        assert!(info.has_audio);
        assert!(info.has_video);
    }

    #[test]
    fn test_parse_probe_output_detects_missing_audio() {
        let json = r#"{
            "streams": [{"codec_type": "video"}],
            "format": {"duration": "3.2"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!(!info.has_audio);
        assert!(info.has_video);
    }

    #[test]
    fn test_parse_probe_output_rejects_missing_duration() {
        let json = r#"{"streams": [], "format": {}}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(TolkError::Media(_))
        ));
    }

    #[tokio::test]
    async fn test_dropped_command_future_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");

        // The child would create the marker after outliving the timeout.
        let script = format!("sleep 1 && touch {}", marker.display());
        let mut cmd = command("sh");
        cmd.arg("-c").arg(&script);

        let ran = tokio::time::timeout(std::time::Duration::from_millis(100), cmd.output()).await;
        assert!(ran.is_err(), "sleep should outlive the timeout");

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "child survived its dropped future");
    }
}
