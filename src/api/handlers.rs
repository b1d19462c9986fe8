//! Request handlers for the JSON API.

use super::AppState;
use crate::config::SOURCE_EXTENSION;
use crate::convert::convert_document;
use crate::error::ServiceError;
use crate::pipeline::sanitize::{has_extension, sanitize_base_name};
use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

/// Multipart field that carries the document.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    /// Stored source name, `<base>.jsf`.
    pub input: String,
    /// Generated artifact name, `<base>.pdf`.
    pub output: String,
}

/// `GET /api/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// `GET /api/files`
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileListResponse>, ServiceError> {
    let files = state.storage.list_artifacts().await?;
    debug!("Listing {} artifacts", files.len());
    Ok(Json(FileListResponse { files }))
}

/// `GET /api/download/{name}`
#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ServiceError> {
    let (file_name, path) = state.storage.locate_artifact(&name).await?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ServiceError::NotFound("File not found".into())
        } else {
            ServiceError::io(&path, e)
        }
    })?;
    let len = file.metadata().await.ok().map(|m| m.len());

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", disposition_name(&file_name)),
        );
    if let Some(len) = len {
        response = response.header(header::CONTENT_LENGTH, len);
    }

    response
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ServiceError::Unexpected(format!("Failed to build download response: {e}")))
}

/// `POST /api/upload`
///
/// Streams the `file` field into `inputs/`, converts it, and answers only
/// after the converter has settled.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServiceError> {
    let mut multipart = multipart.map_err(|e| {
        ServiceError::Validation(format!("Expected a multipart upload: {}", e.body_text()))
    })?;
    let limit = state.config.max_upload_bytes;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ServiceError::Validation("Uploaded file has no filename".into()))?;
        if !has_extension(&original_name, SOURCE_EXTENSION) {
            return Err(ServiceError::Validation(format!(
                "Only .{SOURCE_EXTENSION} files are allowed"
            )));
        }

        let base = sanitize_base_name(&original_name);
        let mut staged = state.storage.stage_upload(limit)?;
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            staged.write_chunk(&chunk).await?;
        }
        let document = staged.commit(&state.storage, base, original_name).await?;

        let output = convert_document(&document, &state.storage, &state.invoker).await?;

        info!(
            input = %document.file_name(),
            output = %output.artifact.file_name(),
            "Upload converted"
        );
        return Ok(Json(UploadResponse {
            message: "File converted successfully".to_string(),
            input: document.file_name(),
            output: output.artifact.file_name(),
        }));
    }

    Err(ServiceError::Validation(format!(
        "No file uploaded. Send a .{SOURCE_EXTENSION} file in the '{UPLOAD_FIELD}' field"
    )))
}

/// Body-limit breaches surface as 413; every other multipart failure is a
/// malformed request.
fn multipart_error(e: MultipartError, limit: u64) -> ServiceError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::too_large(limit)
    } else {
        ServiceError::Validation(format!("Malformed upload: {}", e.body_text()))
    }
}

/// Quote-safe, header-safe rendition of a file name.
fn disposition_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
