//! Mock remote storage for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::remote::{ChildrenPage, ContentStream, RemoteError, RemoteItem, RemoteStorage};

/// A recorded remote call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetMetadata(String),
    ListChildren {
        folder_id: String,
        page_token: Option<String>,
    },
    OpenContent(String),
}

#[derive(Debug, Clone)]
struct MockNode {
    item: RemoteItem,
    children: Vec<String>,
    content: Vec<u8>,
}

/// How an injected failure fires.
#[derive(Debug, Clone)]
enum Failure {
    /// Every call touching the item fails.
    Always(RemoteError),
    /// The content stream fails after yielding this many chunks.
    MidStream { after_chunks: usize, error: RemoteError },
}

/// In-memory implementation of [`RemoteStorage`].
///
/// Provides controllable behavior for testing:
/// - Build a file/folder tree with `add_folder` / `add_file`
/// - Force pagination with a small page size
/// - Inject failures per item, including mid-download
/// - Record every call for assertions
///
/// # Example
///
/// ```rust,ignore
/// use driveseed_core::testing::MockRemoteStorage;
///
/// let remote = MockRemoteStorage::new();
/// remote.add_folder(None, "root", "Photos").await;
/// remote.add_file(Some("root"), "f1", "a.jpg", b"jpeg".to_vec()).await;
/// remote.set_page_size(1).await;
///
/// // Walk it...
///
/// assert_eq!(remote.call_count().await, 4);
/// ```
#[derive(Debug)]
pub struct MockRemoteStorage {
    nodes: Arc<RwLock<HashMap<String, MockNode>>>,
    failures: Arc<RwLock<HashMap<String, Failure>>>,
    calls: Arc<RwLock<Vec<RemoteCall>>>,
    page_size: Arc<RwLock<usize>>,
    chunk_size: Arc<RwLock<usize>>,
}

impl Default for MockRemoteStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteStorage {
    /// Create an empty mock remote.
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            page_size: Arc::new(RwLock::new(100)),
            chunk_size: Arc::new(RwLock::new(4)),
        }
    }

    /// Add a folder, optionally under an existing parent.
    pub async fn add_folder(&self, parent_id: Option<&str>, id: &str, name: &str) {
        self.insert(parent_id, RemoteItem::folder(id, name), Vec::new())
            .await;
    }

    /// Add a file with the given content, optionally under an existing parent.
    pub async fn add_file(
        &self,
        parent_id: Option<&str>,
        id: &str,
        name: &str,
        content: impl Into<Vec<u8>>,
    ) {
        self.insert(parent_id, RemoteItem::file(id, name), content.into())
            .await;
    }

    async fn insert(&self, parent_id: Option<&str>, item: RemoteItem, content: Vec<u8>) {
        let mut nodes = self.nodes.write().await;
        if let Some(parent) = parent_id.and_then(|p| nodes.get_mut(p)) {
            parent.children.push(item.id.clone());
        }
        nodes.insert(
            item.id.clone(),
            MockNode {
                item,
                children: Vec::new(),
                content,
            },
        );
    }

    /// Set how many children a listing page holds.
    pub async fn set_page_size(&self, size: usize) {
        *self.page_size.write().await = size.max(1);
    }

    /// Set the chunk size of content streams.
    pub async fn set_chunk_size(&self, size: usize) {
        *self.chunk_size.write().await = size.max(1);
    }

    /// Make every call touching `id` fail with `error`.
    pub async fn fail_on(&self, id: &str, error: RemoteError) {
        self.failures
            .write()
            .await
            .insert(id.to_string(), Failure::Always(error));
    }

    /// Make the content stream of `id` fail after `after_chunks` chunks.
    pub async fn fail_mid_stream(&self, id: &str, after_chunks: usize, error: RemoteError) {
        self.failures
            .write()
            .await
            .insert(id.to_string(), Failure::MidStream { after_chunks, error });
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RemoteCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    async fn record(&self, call: RemoteCall) {
        self.calls.write().await.push(call);
    }

    async fn check_failure(&self, id: &str) -> Result<(), RemoteError> {
        match self.failures.read().await.get(id) {
            Some(Failure::Always(error)) => Err(error.clone()),
            _ => Ok(()),
        }
    }

    async fn node(&self, id: &str) -> Result<MockNode, RemoteError> {
        self.nodes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound { id: id.to_string() })
    }
}

#[async_trait]
impl RemoteStorage for MockRemoteStorage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_metadata(&self, id: &str) -> Result<RemoteItem, RemoteError> {
        self.record(RemoteCall::GetMetadata(id.to_string())).await;
        self.check_failure(id).await?;
        Ok(self.node(id).await?.item)
    }

    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChildrenPage, RemoteError> {
        self.record(RemoteCall::ListChildren {
            folder_id: folder_id.to_string(),
            page_token: page_token.map(String::from),
        })
        .await;
        self.check_failure(folder_id).await?;

        let node = self.node(folder_id).await?;
        let start = match page_token {
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| RemoteError::Api {
                    status: 400,
                    message: format!("Invalid page token: {}", token),
                })?,
            None => 0,
        };
        let page_size = *self.page_size.read().await;
        let end = (start + page_size).min(node.children.len());

        let nodes = self.nodes.read().await;
        let items = node.children[start.min(end)..end]
            .iter()
            .filter_map(|id| nodes.get(id).map(|n| n.item.clone()))
            .collect();

        Ok(ChildrenPage {
            items,
            next_page_token: (end < node.children.len()).then(|| format!("page-{}", end)),
        })
    }

    async fn open_content(&self, file_id: &str) -> Result<Box<dyn ContentStream>, RemoteError> {
        self.record(RemoteCall::OpenContent(file_id.to_string()))
            .await;
        self.check_failure(file_id).await?;

        let node = self.node(file_id).await?;
        let fail_after = match self.failures.read().await.get(file_id) {
            Some(Failure::MidStream { after_chunks, error }) => {
                Some((*after_chunks, error.clone()))
            }
            _ => None,
        };

        Ok(Box::new(MockContentStream {
            data: node.content,
            offset: 0,
            chunk_size: *self.chunk_size.read().await,
            chunks_sent: 0,
            fail_after,
        }))
    }
}

struct MockContentStream {
    data: Vec<u8>,
    offset: usize,
    chunk_size: usize,
    chunks_sent: usize,
    fail_after: Option<(usize, RemoteError)>,
}

#[async_trait]
impl ContentStream for MockContentStream {
    fn total_bytes(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, RemoteError> {
        if let Some((after, error)) = &self.fail_after {
            if self.chunks_sent >= *after {
                return Err(error.clone());
            }
        }
        if self.offset >= self.data.len() {
            return Ok(None);
        }

        let end = (self.offset + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.offset..end].to_vec();
        self.offset = end;
        self.chunks_sent += 1;
        Ok(Some(chunk))
    }
}
