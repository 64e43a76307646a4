//! Error types for conversion sessions.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::link::LinkError;
use crate::staging::StagingError;
use crate::torrent::TorrentError;
use crate::walker::WalkError;

/// Why a conversion failed.
///
/// Every variant maps to a stable [`kind`](Self::kind) string that delivery
/// adapters can surface to users.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The trigger text held no recognizable share link.
    #[error(transparent)]
    InvalidLink(#[from] LinkError),

    /// The remote walk failed.
    #[error(transparent)]
    RemoteAccess(WalkError),

    /// A staging directory could not be allocated.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// Writing local content or the artifact failed.
    #[error("Local I/O error at {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hashing or serializing the artifact failed.
    #[error("Torrent build failed: {0}")]
    Build(#[from] TorrentError),
}

impl ConversionError {
    pub fn local_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidLink(_) => "invalid_link",
            Self::RemoteAccess(_) => "remote_access",
            Self::Staging(_) | Self::LocalIo { .. } => "local_io",
            Self::Build(_) => "build",
        }
    }
}

impl From<WalkError> for ConversionError {
    fn from(e: WalkError) -> Self {
        match e {
            WalkError::LocalIo { path, source } => Self::LocalIo { path, source },
            other => Self::RemoteAccess(other),
        }
    }
}
