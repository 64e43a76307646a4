//! Remote storage: the read-only contract the walker consumes.
//!
//! Three operations are needed and nothing else:
//!
//! - resolve an item id to `{id, name, mimeType}`
//! - list a folder's children, one page at a time
//! - read a file's bytes in bounded chunks
//!
//! [`DriveClient`] implements them against the Google Drive v3 REST API.
//! Tests use [`crate::testing::MockRemoteStorage`].

mod drive;
mod error;
mod traits;
mod types;

pub use drive::DriveClient;
pub use error::RemoteError;
pub use traits::{ContentStream, RemoteStorage};
pub use types::{ChildrenPage, RemoteItem, FOLDER_MIME_TYPE};
