//! HTTP API server exposing Tolk's jobs to other systems.
//!
//! Uploads are written under per-run unique names in the work directory and
//! removed once the job finishes; finished products live in the output
//! directory and are served back under /files.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::TolkError;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::warn;
use uuid::Uuid;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    upload_dir: PathBuf,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tolk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let max_upload_bytes = settings.server.max_upload_mb * 1024 * 1024;

    let orchestrator = Orchestrator::new(settings)?;
    let output_dir = orchestrator.output_dir().to_path_buf();
    let upload_dir = orchestrator.settings().work_dir();

    let state = Arc::new(AppState {
        orchestrator,
        upload_dir,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/translate", post(translate))
        .route("/summarize", post(summarize))
        .route("/transcribe", post(transcribe))
        .route("/subtitles", post(subtitles))
        .route("/dub", post(dub))
        .nest_service("/files", ServeDir::new(output_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tolk API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Translate", "POST /translate");
    Output::kv("Summarize", "POST /summarize");
    Output::kv("Transcribe", "POST /transcribe (multipart)");
    Output::kv("Subtitles", "POST /subtitles (multipart)");
    Output::kv("Dub", "POST /dub (multipart)");
    Output::kv("Files", "GET  /files/{name}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct TranslateRequest {
    text: String,
    #[serde(default = "default_language")]
    lang: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Serialize)]
struct TranslateResponse {
    original: String,
    translated: String,
    target_language: String,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    text: String,
    #[serde(default = "default_language")]
    input_lang: String,
    #[serde(default = "default_language")]
    output_lang: String,
}

#[derive(Serialize)]
struct SummarizeResponse {
    original_text: String,
    processed_for_summarization: String,
    summary: String,
    summarized_in_english: String,
    input_language: String,
    output_language: String,
}

#[derive(Serialize)]
struct TranscribeResponse {
    transcription: String,
    translation: String,
    subtitle_file_url: String,
}

#[derive(Serialize)]
struct SubtitlesResponse {
    transcription: String,
    subtitles: String,
    subtitle_file_url: String,
}

#[derive(Serialize)]
struct DubResponse {
    translated_text: String,
    output_file_url: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranslateRequest>,
) -> impl IntoResponse {
    match state.orchestrator.translate_text(&req.text, &req.lang).await {
        Ok(job) => Json(TranslateResponse {
            original: job.original,
            translated: job.translated,
            target_language: job.target_language,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> impl IntoResponse {
    match state
        .orchestrator
        .summarize_text(&req.text, &req.input_lang, &req.output_lang)
        .await
    {
        Ok(job) => Json(SummarizeResponse {
            original_text: job.original_text,
            processed_for_summarization: job.processed_text,
            summary: job.summary,
            summarized_in_english: job.english_summary,
            input_language: job.input_language,
            output_language: job.output_language,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let upload = match read_upload(&mut multipart, &state.upload_dir, "mp3").await {
        Ok(upload) => upload,
        Err(e) => return error_response(e),
    };

    let result = state.orchestrator.transcribe_audio(&upload.file).await;
    remove_upload(&upload.file);

    match result {
        Ok(job) => Json(TranscribeResponse {
            transcription: job.transcription,
            translation: job.translation,
            subtitle_file_url: file_url(&job.subtitle_path),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn subtitles(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let upload = match read_upload(&mut multipart, &state.upload_dir, "mp4").await {
        Ok(upload) => upload,
        Err(e) => return error_response(e),
    };
    let lang = upload.lang.clone().unwrap_or_else(default_language);

    let result = state
        .orchestrator
        .generate_subtitles(&upload.file, &lang)
        .await;
    remove_upload(&upload.file);

    match result {
        Ok(job) => Json(SubtitlesResponse {
            transcription: job.transcription,
            subtitles: job.subtitles,
            subtitle_file_url: file_url(&job.subtitle_path),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn dub(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> impl IntoResponse {
    let upload = match read_upload(&mut multipart, &state.upload_dir, "mp4").await {
        Ok(upload) => upload,
        Err(e) => return error_response(e),
    };
    let lang = match upload.lang.clone() {
        Some(lang) => lang,
        None => {
            remove_upload(&upload.file);
            return error_response(TolkError::InvalidInput(
                "Missing 'lang' field".to_string(),
            ));
        }
    };

    let result = state.orchestrator.dub_video(&upload.file, &lang).await;
    remove_upload(&upload.file);

    match result {
        Ok(job) => Json(DubResponse {
            translated_text: job.translated_text,
            output_file_url: file_url(&job.output_path),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

// === Upload plumbing ===

/// A multipart upload saved to disk, plus the optional `lang` form field.
struct UploadForm {
    file: PathBuf,
    lang: Option<String>,
}

/// Save the `file` field of a multipart request under a run-unique name.
///
/// The original file name only contributes its extension; the name itself
/// is a fresh UUID so concurrent uploads can never collide. If the request
/// fails after the file was already saved, the saved file is removed before
/// the error propagates.
async fn read_upload(
    multipart: &mut Multipart,
    upload_dir: &Path,
    default_extension: &str,
) -> crate::error::Result<UploadForm> {
    let mut file = None;
    let mut lang = None;

    let collected =
        collect_upload(multipart, upload_dir, default_extension, &mut file, &mut lang).await;
    if let Err(e) = collected {
        if let Some(path) = &file {
            remove_upload(path);
        }
        return Err(e);
    }

    let file = file.ok_or_else(|| TolkError::InvalidInput("No file uploaded".to_string()))?;
    Ok(UploadForm { file, lang })
}

/// Walk the multipart fields, saving `file` to disk and capturing `lang`.
async fn collect_upload(
    multipart: &mut Multipart,
    upload_dir: &Path,
    default_extension: &str,
    file: &mut Option<PathBuf>,
    lang: &mut Option<String>,
) -> crate::error::Result<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| TolkError::InvalidInput(format!("Malformed multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let extension = field
                    .file_name()
                    .and_then(|n| Path::new(n).extension())
                    .and_then(|e| e.to_str())
                    .unwrap_or(default_extension)
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    TolkError::InvalidInput(format!("Failed to read upload: {}", e))
                })?;

                let path = upload_dir.join(format!("{}.{}", Uuid::new_v4(), extension));
                tokio::fs::write(&path, &data).await?;
                *file = Some(path);
            }
            "lang" => {
                *lang = Some(field.text().await.map_err(|e| {
                    TolkError::InvalidInput(format!("Failed to read field: {}", e))
                })?);
            }
            _ => {}
        }
    }

    Ok(())
}

/// Remove an upload once its job is done, keeping errors out of the response.
fn remove_upload(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove upload {}: {}", path.display(), e);
    }
}

/// Public URL for a file in the output directory.
fn file_url(path: &Path) -> String {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => format!("/files/{}", name),
        None => String::new(),
    }
}

/// Map an error to the status code its category deserves.
fn error_response(err: TolkError) -> Response {
    let status = match &err {
        TolkError::InvalidInput(_) | TolkError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
        TolkError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let bad = error_response(TolkError::InvalidInput("no".to_string()));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let unsupported = error_response(TolkError::UnsupportedLanguage("xx".to_string()));
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);

        let unavailable = error_response(TolkError::ModelUnavailable("key".to_string()));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let internal = error_response(TolkError::Media("boom".to_string()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_file_url_uses_file_name_only() {
        assert_eq!(
            file_url(Path::new("/var/tolk/output/talk.srt")),
            "/files/talk.srt"
        );
    }

    #[tokio::test]
    async fn test_read_upload_removes_file_when_stream_dies_midway() {
        use axum::body::Body;
        use axum::extract::FromRequest;

        let dir = tempfile::tempdir().unwrap();

        // A complete file part followed by a field cut off mid-headers, as
        // when a client aborts the connection partway through the request.
        let body = concat!(
            "--X\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"clip.mp3\"\r\n",
            "\r\n",
            "sound-bytes\r\n",
            "--X\r\n",
            "Content-Disposition: form-data; name=\"lang\"\r\n",
        );
        let request = axum::http::Request::builder()
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap();
        let mut multipart = Multipart::from_request(request, &()).await.unwrap();

        let result = read_upload(&mut multipart, dir.path(), "mp3").await;
        assert!(result.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(
            leftovers.is_empty(),
            "saved upload should be removed when the request fails"
        );
    }
}
