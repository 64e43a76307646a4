//! Testing utilities and mock implementations.
//!
//! [`MockRemoteStorage`] stands in for the Drive API so walks and full
//! conversions can run without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use driveseed_core::testing::MockRemoteStorage;
//!
//! let remote = Arc::new(MockRemoteStorage::new());
//! remote.add_folder(None, "root", "Docs").await;
//! remote.add_file(Some("root"), "f1", "a.txt", b"hello".to_vec()).await;
//!
//! // Use in ConversionContext...
//! ```

mod mock_remote;

pub use mock_remote::{MockRemoteStorage, RemoteCall};
