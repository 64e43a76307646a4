//! Trait definitions for the remote storage contract.

use async_trait::async_trait;

use super::error::RemoteError;
use super::types::{ChildrenPage, RemoteItem};

/// Read-only access to a remote file hierarchy.
///
/// Implementations are shared between concurrent sessions behind an `Arc`.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    /// Resolves an item id to its metadata.
    async fn get_metadata(&self, id: &str) -> Result<RemoteItem, RemoteError>;

    /// Lists one page of a folder's children.
    ///
    /// Callers keep requesting with the returned token until it is `None`.
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChildrenPage, RemoteError>;

    /// Opens a file's content for chunked reading.
    async fn open_content(&self, file_id: &str) -> Result<Box<dyn ContentStream>, RemoteError>;
}

/// A file's bytes, consumed in bounded chunks.
#[async_trait]
pub trait ContentStream: Send {
    /// Total size in bytes, when the backend knows it.
    fn total_bytes(&self) -> Option<u64>;

    /// Returns the next chunk, or `None` once the content is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, RemoteError>;
}
