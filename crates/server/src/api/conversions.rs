//! Conversion endpoints: share link or uploaded file in, `.torrent` out.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use driveseed_core::{ConversionError, ConversionOutcome};

use crate::metrics::CONVERSIONS_IN_FLIGHT;
use crate::state::AppState;

pub const BITTORRENT_CONTENT_TYPE: &str = "application/x-bittorrent";

pub const X_SESSION_ID: &str = "x-session-id";
pub const X_INFO_HASH: &str = "x-info-hash";
pub const X_STAGING_DIR: &str = "x-staging-dir";

#[derive(Debug, Deserialize)]
pub struct ConvertLinkRequest {
    /// Text containing a Drive share link.
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// A failed request, rendered as `{error: {kind, message}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: String,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request".to_string(),
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "local_io".to_string(),
            message: message.into(),
        }
    }
}

impl From<ConversionError> for ApiError {
    fn from(e: ConversionError) -> Self {
        let status = match e.kind() {
            "invalid_link" => StatusCode::BAD_REQUEST,
            "remote_access" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: ErrorBody {
                    kind: self.kind,
                    message: self.message,
                },
            }),
        )
            .into_response()
    }
}

/// Decrements the in-flight gauge when a request ends, however it ends.
struct InFlight;

impl InFlight {
    fn start() -> Self {
        CONVERSIONS_IN_FLIGHT.inc();
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        CONVERSIONS_IN_FLIGHT.dec();
    }
}

/// POST /conversions/link
pub async fn convert_link(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConvertLinkRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let _in_flight = InFlight::start();

    let outcome = state.conversions().convert_link(&request.link).await?;
    artifact_response(&outcome).await
}

/// POST /conversions/upload (multipart, `file` field)
pub async fn convert_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut upload: Option<(String, Bytes)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(ApiError::bad_request(format!("Malformed multipart body: {}", e))),
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(String::from)
            .ok_or_else(|| ApiError::bad_request("The file field has no filename"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
        upload = Some((filename, bytes));
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("Missing multipart field: file"))?;
    info!(filename = %filename, bytes = bytes.len(), "Received upload");

    let _in_flight = InFlight::start();
    let outcome = state
        .conversions()
        .convert_upload_bytes(&filename, &bytes)
        .await?;
    artifact_response(&outcome).await
}

async fn artifact_response(outcome: &ConversionOutcome) -> Result<Response, ApiError> {
    let body = tokio::fs::read(&outcome.artifact_path).await.map_err(|e| {
        warn!(path = %outcome.artifact_path.display(), error = %e, "Artifact vanished");
        ApiError::internal(format!("Failed to read artifact: {}", e))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(BITTORRENT_CONTENT_TYPE),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&outcome.artifact_name()),
    );
    if let Ok(value) = HeaderValue::from_str(&outcome.session_id) {
        headers.insert(HeaderName::from_static(X_SESSION_ID), value);
    }
    if let Ok(value) = HeaderValue::from_str(&outcome.info_hash) {
        headers.insert(HeaderName::from_static(X_INFO_HASH), value);
    }
    if let Ok(value) = HeaderValue::from_str(&outcome.staging_dir.to_string_lossy()) {
        headers.insert(HeaderName::from_static(X_STAGING_DIR), value);
    }

    Ok((StatusCode::OK, headers, body).into_response())
}

/// `attachment; filename="..."` with quotes, backslashes and non-ASCII replaced.
fn content_disposition(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
