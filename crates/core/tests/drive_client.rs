//! Drive client tests against a local HTTP server.
//!
//! A small axum app stands in for the Drive v3 endpoints so the client's
//! status handling, ranged downloads and pagination run over real HTTP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tempfile::TempDir;

use driveseed_core::{
    config::{DriveConfig, WalkerConfig},
    remote::{ContentStream, RemoteError, RemoteStorage, FOLDER_MIME_TYPE},
    DriveClient, TreeWalker,
};

/// How the fake server answers `alt=media` requests.
#[derive(Clone, Copy)]
enum ContentMode {
    /// Honors `Range` with 206, or 416 past the end.
    Ranged,
    /// Ignores `Range` and always sends the whole body.
    FullBody,
    /// Honors the first range, then falls back to the whole body.
    FullBodyAfterFirstRange,
}

struct FakeItem {
    name: String,
    mime_type: String,
    content: Vec<u8>,
}

#[derive(Default)]
struct FakeDrive {
    items: Mutex<HashMap<String, FakeItem>>,
    /// Folder id -> pages of child ids.
    pages: Mutex<HashMap<String, Vec<Vec<String>>>>,
    modes: Mutex<HashMap<String, ContentMode>>,
    /// Item id -> (status, body) returned for any request touching it.
    errors: Mutex<HashMap<String, (StatusCode, String)>>,
    ranges: Mutex<Vec<String>>,
    page_tokens: Mutex<Vec<Option<String>>>,
    auth_headers: Mutex<Vec<Option<String>>>,
    api_keys: Mutex<Vec<Option<String>>>,
}

impl FakeDrive {
    fn add_folder(&self, id: &str, name: &str, pages: Vec<Vec<&str>>) {
        self.items.lock().unwrap().insert(
            id.to_string(),
            FakeItem {
                name: name.to_string(),
                mime_type: FOLDER_MIME_TYPE.to_string(),
                content: Vec::new(),
            },
        );
        let pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(String::from).collect())
            .collect();
        self.pages.lock().unwrap().insert(id.to_string(), pages);
    }

    fn add_file(&self, id: &str, name: &str, content: &[u8]) {
        self.items.lock().unwrap().insert(
            id.to_string(),
            FakeItem {
                name: name.to_string(),
                mime_type: "application/octet-stream".to_string(),
                content: content.to_vec(),
            },
        );
    }

    fn set_mode(&self, id: &str, mode: ContentMode) {
        self.modes.lock().unwrap().insert(id.to_string(), mode);
    }

    fn fail(&self, id: &str, status: StatusCode, body: &str) {
        self.errors
            .lock()
            .unwrap()
            .insert(id.to_string(), (status, body.to_string()));
    }

    fn record_auth(&self, headers: &HeaderMap, query: &HashMap<String, String>) {
        self.auth_headers.lock().unwrap().push(
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        );
        self.api_keys.lock().unwrap().push(query.get("key").cloned());
    }

    fn error_for(&self, id: &str) -> Option<Response> {
        self.errors
            .lock()
            .unwrap()
            .get(id)
            .map(|(status, body)| (*status, body.clone()).into_response())
    }
}

fn parse_range(headers: &HeaderMap) -> (u64, u64) {
    let value = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("bytes=0-");
    let spec = value.trim_start_matches("bytes=");
    let (start, end) = spec.split_once('-').unwrap();
    (
        start.parse().unwrap(),
        end.parse().unwrap_or(u64::MAX),
    )
}

fn ranged_response(content: &[u8], start: u64, end: u64) -> Response {
    let len = content.len() as u64;
    if start >= len {
        return (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{}", len))],
        )
            .into_response();
    }
    let last = end.min(len - 1);
    (
        StatusCode::PARTIAL_CONTENT,
        [(header::CONTENT_RANGE, format!("bytes {}-{}/{}", start, last, len))],
        content[start as usize..=last as usize].to_vec(),
    )
        .into_response()
}

async fn get_file(
    State(drive): State<Arc<FakeDrive>>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    drive.record_auth(&headers, &query);
    if let Some(response) = drive.error_for(&id) {
        return response;
    }

    let items = drive.items.lock().unwrap();
    let Some(item) = items.get(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": 404, "message": format!("File not found: {}", id)}})),
        )
            .into_response();
    };

    if query.get("alt").map(String::as_str) != Some("media") {
        return Json(json!({"id": id, "name": item.name, "mimeType": item.mime_type}))
            .into_response();
    }

    if let Some(range) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        drive.ranges.lock().unwrap().push(range.to_string());
    }
    let (start, end) = parse_range(&headers);
    let mode = drive
        .modes
        .lock()
        .unwrap()
        .get(&id)
        .copied()
        .unwrap_or(ContentMode::Ranged);

    match mode {
        ContentMode::Ranged => ranged_response(&item.content, start, end),
        ContentMode::FullBody => (StatusCode::OK, item.content.clone()).into_response(),
        ContentMode::FullBodyAfterFirstRange if start == 0 => {
            ranged_response(&item.content, start, end)
        }
        ContentMode::FullBodyAfterFirstRange => {
            (StatusCode::OK, item.content.clone()).into_response()
        }
    }
}

async fn list_files(
    State(drive): State<Arc<FakeDrive>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    drive.record_auth(&headers, &query);

    // q = "'<id>' in parents and trashed = false"
    let q = query.get("q").cloned().unwrap_or_default();
    let folder_id = q.split('\'').nth(1).unwrap_or_default().to_string();
    if let Some(response) = drive.error_for(&folder_id) {
        return response;
    }

    let token = query.get("pageToken").cloned();
    drive.page_tokens.lock().unwrap().push(token.clone());
    let index: usize = token
        .as_deref()
        .and_then(|t| t.strip_prefix("tok-"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);

    let pages = drive.pages.lock().unwrap();
    let folder_pages = pages.get(&folder_id).cloned().unwrap_or_default();
    let items = drive.items.lock().unwrap();
    let files: Vec<_> = folder_pages
        .get(index)
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|id| {
            let item = &items[id];
            json!({"id": id, "name": item.name, "mimeType": item.mime_type})
        })
        .collect();

    let mut body = json!({ "files": files });
    if index + 1 < folder_pages.len() {
        body["nextPageToken"] = json!(format!("tok-{}", index + 1));
    }
    Json(body).into_response()
}

async fn serve(drive: Arc<FakeDrive>) -> String {
    let app = Router::new()
        .route("/files", get(list_files))
        .route("/files/{id}", get(get_file))
        .with_state(drive);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client(drive: &Arc<FakeDrive>, chunk_size_bytes: u64) -> DriveClient {
    let base = serve(drive.clone()).await;
    DriveClient::new(DriveConfig {
        api_base_url: base,
        chunk_size_bytes,
        page_size: 2,
        timeout_secs: 10,
        ..Default::default()
    })
    .unwrap()
}

async fn read_all(stream: &mut Box<dyn ContentStream>) -> Result<Vec<Vec<u8>>, RemoteError> {
    let mut chunks = Vec::new();
    while let Some(chunk) = stream.next_chunk().await? {
        chunks.push(chunk);
    }
    Ok(chunks)
}

// =============================================================================
// Content downloads
// =============================================================================

#[tokio::test]
async fn test_ranged_download_uses_content_range_total() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_file("f1", "digits.txt", b"0123456789");
    let client = client(&drive, 4).await;

    let mut stream = client.open_content("f1").await.unwrap();
    assert_eq!(stream.total_bytes(), Some(10));

    let chunks = read_all(&mut stream).await.unwrap();
    assert_eq!(chunks, vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]);
    assert_eq!(
        *drive.ranges.lock().unwrap(),
        vec!["bytes=0-3", "bytes=4-7", "bytes=8-11"]
    );
}

#[tokio::test]
async fn test_empty_file_is_range_not_satisfiable() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_file("empty", "empty.txt", b"");
    let client = client(&drive, 4).await;

    let mut stream = client.open_content("empty").await.unwrap();

    assert_eq!(stream.total_bytes(), Some(0));
    assert!(stream.next_chunk().await.unwrap().is_none());
    assert_eq!(drive.ranges.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ignored_range_returns_whole_body_once() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_file("f1", "whole.bin", b"abcdefgh");
    drive.set_mode("f1", ContentMode::FullBody);
    let client = client(&drive, 4).await;

    let mut stream = client.open_content("f1").await.unwrap();
    assert_eq!(stream.total_bytes(), Some(8));

    let chunks = read_all(&mut stream).await.unwrap();
    assert_eq!(chunks, vec![b"abcdefgh".to_vec()]);
    assert_eq!(drive.ranges.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_whole_body_after_partial_read_is_an_error() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_file("f1", "split.bin", b"abcdefgh");
    drive.set_mode("f1", ContentMode::FullBodyAfterFirstRange);
    let client = client(&drive, 4).await;

    let mut stream = client.open_content("f1").await.unwrap();
    assert_eq!(stream.next_chunk().await.unwrap(), Some(b"abcd".to_vec()));

    let err = stream.next_chunk().await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_huge_chunk_size_does_not_overflow() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_file("f1", "hello.txt", b"hello");
    let client = client(&drive, u64::MAX).await;

    let mut stream = client.open_content("f1").await.unwrap();
    let chunks = read_all(&mut stream).await.unwrap();

    assert_eq!(chunks, vec![b"hello".to_vec()]);
    assert_eq!(
        *drive.ranges.lock().unwrap(),
        vec![format!("bytes=0-{}", u64::MAX - 1)]
    );
}

// =============================================================================
// Status mapping
// =============================================================================

#[tokio::test]
async fn test_missing_item_is_not_found() {
    let drive = Arc::new(FakeDrive::default());
    let client = client(&drive, 4).await;

    let err = client.get_metadata("nope").await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound { ref id } if id == "nope"));

    let err = client.open_content("nope").await.err().unwrap();
    assert!(matches!(err, RemoteError::NotFound { .. }));
}

#[tokio::test]
async fn test_error_body_message_is_extracted() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_file("locked", "locked.bin", b"x");
    drive.fail(
        "locked",
        StatusCode::FORBIDDEN,
        r#"{"error":{"code":403,"message":"The download quota for this file has been exceeded."}}"#,
    );
    let client = client(&drive, 4).await;

    match client.get_metadata("locked").await.unwrap_err() {
        RemoteError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "The download quota for this file has been exceeded.");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let err = client.open_content("locked").await.err().unwrap();
    assert!(matches!(err, RemoteError::Api { status: 403, .. }));
}

#[tokio::test]
async fn test_plain_error_body_passed_through() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_folder("dir", "dir", vec![vec![]]);
    drive.fail("dir", StatusCode::SERVICE_UNAVAILABLE, "backend overloaded");
    let client = client(&drive, 4).await;

    let err = client.list_children("dir", None).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Api { status: 503, ref message } if message == "backend overloaded"
    ));
}

// =============================================================================
// Listing and credentials
// =============================================================================

#[tokio::test]
async fn test_listing_follows_next_page_token() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_folder("dir", "Dir", vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
    for id in ["a", "b", "c", "d", "e"] {
        drive.add_file(id, id, id.as_bytes());
    }
    let client = client(&drive, 4).await;

    let mut names = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = client.list_children("dir", token.as_deref()).await.unwrap();
        names.extend(page.items.into_iter().map(|item| item.name));
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(
        *drive.page_tokens.lock().unwrap(),
        vec![None, Some("tok-1".to_string()), Some("tok-2".to_string())]
    );
}

#[tokio::test]
async fn test_credentials_are_sent() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_file("f1", "a.txt", b"abc");
    let base = serve(drive.clone()).await;
    let client = DriveClient::new(DriveConfig {
        api_base_url: base,
        api_key: Some("key-123".to_string()),
        access_token: Some("ya29.token".to_string()),
        ..Default::default()
    })
    .unwrap();

    client.get_metadata("f1").await.unwrap();
    client.open_content("f1").await.unwrap();

    for auth in drive.auth_headers.lock().unwrap().iter() {
        assert_eq!(auth.as_deref(), Some("Bearer ya29.token"));
    }
    for key in drive.api_keys.lock().unwrap().iter() {
        assert_eq!(key.as_deref(), Some("key-123"));
    }
    assert_eq!(drive.auth_headers.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_walk_over_http() {
    let drive = Arc::new(FakeDrive::default());
    drive.add_folder("root", "Shared", vec![vec!["a", "sub"], vec!["b"]]);
    drive.add_folder("sub", "Nested", vec![vec!["c"]]);
    drive.add_file("a", "A.txt", b"first file");
    drive.add_file("b", "B.txt", b"");
    drive.add_file("c", "C.txt", b"deeper content here");
    let client = client(&drive, 4).await;

    let temp = TempDir::new().unwrap();
    let walker = TreeWalker::new(Arc::new(client), &WalkerConfig::default());
    let report = walker.walk("root", temp.path()).await.unwrap();

    let root = temp.path().join("Shared");
    assert_eq!(report.root_local_path, root);
    assert_eq!(report.files, 3);
    assert_eq!(report.bytes, 29);
    assert_eq!(std::fs::read(root.join("A.txt")).unwrap(), b"first file");
    assert_eq!(std::fs::read(root.join("B.txt")).unwrap(), b"");
    assert_eq!(
        std::fs::read(root.join("Nested/C.txt")).unwrap(),
        b"deeper content here"
    );
}
