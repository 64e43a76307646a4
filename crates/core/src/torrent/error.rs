//! Error types for the torrent module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or inspecting an artifact.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// Reading content failed.
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content root holds no regular files.
    #[error("No files to hash under {path}")]
    NoFiles { path: PathBuf },

    /// Piece length is not a power of two or is too small.
    #[error("Invalid piece length {length}: must be a power of two >= {min}")]
    InvalidPieceLength { length: u64, min: u64 },

    /// A path component is not valid UTF-8.
    #[error("Path is not valid UTF-8: {path}")]
    InvalidPath { path: PathBuf },

    /// Serializing the metainfo failed.
    #[error("Failed to encode torrent: {0}")]
    Encode(String),

    /// The artifact could not be parsed back.
    #[error("Failed to parse torrent: {0}")]
    Parse(String),
}

impl TorrentError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
