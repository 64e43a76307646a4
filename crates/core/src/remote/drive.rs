//! Google Drive v3 backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::DriveConfig;

use super::error::RemoteError;
use super::traits::{ContentStream, RemoteStorage};
use super::types::{ChildrenPage, RemoteItem};

/// Drive REST client implementing [`RemoteStorage`].
pub struct DriveClient {
    client: Client,
    config: DriveConfig,
}

impl DriveClient {
    /// Create a new Drive client.
    pub fn new(config: DriveConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        if config.api_key.is_none() && config.access_token.is_none() {
            warn!("Drive client has no api_key or access_token; only public items will resolve");
        }

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    /// Appends the API key, if configured, to a URL that already has a query.
    fn with_key(&self, mut url: String) -> String {
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            url.push_str("&key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    fn metadata_url(&self, id: &str) -> String {
        self.with_key(format!(
            "{}/files/{}?fields={}&supportsAllDrives=true",
            self.base_url(),
            urlencoding::encode(id),
            urlencoding::encode("id,name,mimeType"),
        ))
    }

    fn list_url(&self, folder_id: &str, page_token: Option<&str>) -> String {
        let query = format!("'{}' in parents and trashed = false", escape_query_value(folder_id));
        let mut url = format!(
            "{}/files?q={}&fields={}&pageSize={}&supportsAllDrives=true&includeItemsFromAllDrives=true",
            self.base_url(),
            urlencoding::encode(&query),
            urlencoding::encode("nextPageToken,files(id,name,mimeType)"),
            self.config.page_size,
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }
        self.with_key(url)
    }

    fn content_url(&self, file_id: &str) -> String {
        self.with_key(format!(
            "{}/files/{}?alt=media&supportsAllDrives=true",
            self.base_url(),
            urlencoding::encode(file_id),
        ))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        authorize(request, self.config.access_token.as_deref())
    }
}

fn authorize(request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
    match access_token.filter(|t| !t.is_empty()) {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

#[async_trait]
impl RemoteStorage for DriveClient {
    fn name(&self) -> &str {
        "google-drive"
    }

    async fn get_metadata(&self, id: &str) -> Result<RemoteItem, RemoteError> {
        let url = self.metadata_url(id);
        debug!(item_id = id, "Fetching Drive metadata");

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = check_status(id, response).await?;

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("metadata for {}: {}", id, e)))?;

        Ok(file.into())
    }

    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChildrenPage, RemoteError> {
        let url = self.list_url(folder_id, page_token);
        debug!(
            folder_id = folder_id,
            has_token = page_token.is_some(),
            "Listing Drive folder page"
        );

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = check_status(folder_id, response).await?;

        let list: DriveFileList = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("listing of {}: {}", folder_id, e)))?;

        Ok(ChildrenPage {
            items: list.files.into_iter().map(RemoteItem::from).collect(),
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn open_content(&self, file_id: &str) -> Result<Box<dyn ContentStream>, RemoteError> {
        let mut stream = DriveContentStream {
            client: self.client.clone(),
            url: self.content_url(file_id),
            file_id: file_id.to_string(),
            access_token: self.config.access_token.clone(),
            chunk_size: self.config.chunk_size_bytes.max(1),
            offset: 0,
            total: None,
            pending: None,
            done: false,
        };

        // Fetch the first range eagerly so missing files fail here and the
        // total size is known before the caller reads anything.
        stream.pending = stream.fetch_range().await?;
        Ok(Box::new(stream))
    }
}

/// Ranged `alt=media` reader.
struct DriveContentStream {
    client: Client,
    url: String,
    file_id: String,
    access_token: Option<String>,
    chunk_size: u64,
    offset: u64,
    total: Option<u64>,
    pending: Option<Vec<u8>>,
    done: bool,
}

impl DriveContentStream {
    async fn fetch_range(&mut self) -> Result<Option<Vec<u8>>, RemoteError> {
        if self.done {
            return Ok(None);
        }

        let end = self.offset.saturating_add(self.chunk_size - 1);
        let request = self
            .client
            .get(&self.url)
            .header(header::RANGE, format!("bytes={}-{}", self.offset, end));
        let response = authorize(request, self.access_token.as_deref()).send().await?;

        match response.status() {
            StatusCode::RANGE_NOT_SATISFIABLE if self.offset == 0 => {
                // Zero-length file: nothing satisfies any range.
                self.total = Some(0);
                self.done = true;
                Ok(None)
            }
            StatusCode::PARTIAL_CONTENT => {
                if let Some(total) = response
                    .headers()
                    .get(header::CONTENT_RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_content_range_total)
                {
                    self.total = Some(total);
                }

                let body = response.bytes().await?.to_vec();
                self.offset += body.len() as u64;

                let exhausted = match self.total {
                    Some(total) => self.offset >= total,
                    None => (body.len() as u64) < self.chunk_size,
                };
                if body.is_empty() || exhausted {
                    self.done = true;
                }

                Ok((!body.is_empty()).then_some(body))
            }
            StatusCode::OK if self.offset > 0 => Err(RemoteError::Decode(format!(
                "full body returned for {} after {} bytes were already read",
                self.file_id, self.offset
            ))),
            StatusCode::OK => {
                // The server ignored the range and sent the whole file.
                let body = response.bytes().await?.to_vec();
                self.offset = body.len() as u64;
                self.total = Some(self.offset);
                self.done = true;
                Ok((!body.is_empty()).then_some(body))
            }
            _ => {
                let err = check_status(&self.file_id, response).await.err();
                Err(err.unwrap_or_else(|| RemoteError::Api {
                    status: 0,
                    message: "unexpected download status".to_string(),
                }))
            }
        }
    }
}

#[async_trait]
impl ContentStream for DriveContentStream {
    fn total_bytes(&self) -> Option<u64> {
        self.total
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, RemoteError> {
        if let Some(chunk) = self.pending.take() {
            return Ok(Some(chunk));
        }
        self.fetch_range().await
    }
}

/// Maps non-success responses to [`RemoteError`], passing successes through.
async fn check_status(id: &str, response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound { id: id.to_string() });
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}

/// Pulls `error.message` out of a Drive error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<DriveErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// `bytes 0-99/1234` -> 1234. Unknown totals (`*`) yield `None`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

/// Escapes a value for use inside a single-quoted Drive query string.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

// Drive API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
}

impl From<DriveFile> for RemoteItem {
    fn from(f: DriveFile) -> Self {
        RemoteItem::new(f.id, f.name, f.mime_type)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: DriveErrorDetail,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    #[serde(default)]
    message: Option<String>,
}
