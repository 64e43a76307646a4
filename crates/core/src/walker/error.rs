//! Error types for the walker module.

use std::path::PathBuf;
use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that abort a tree walk.
#[derive(Debug, Error)]
pub enum WalkError {
    /// A metadata, listing or download call failed.
    #[error("Remote access failed for {item_id}: {source}")]
    Remote {
        item_id: String,
        #[source]
        source: RemoteError,
    },

    /// A local directory or file could not be created or written.
    #[error("Local I/O failed at {path}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tree is deeper than the configured limit.
    #[error("Folder nesting exceeds max depth {max_depth} at {item_id}")]
    DepthExceeded { item_id: String, max_depth: usize },
}

impl WalkError {
    pub fn remote(item_id: impl Into<String>, source: RemoteError) -> Self {
        Self::Remote {
            item_id: item_id.into(),
            source,
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the failure came from the remote side.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::DepthExceeded { .. })
    }
}
