//! Types for the walker module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of a completed walk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkReport {
    /// Local path of the walked root (file or folder).
    pub root_local_path: PathBuf,
    /// Number of files downloaded.
    pub files: usize,
    /// Number of folders created, root included.
    pub folders: usize,
    /// Total bytes written.
    pub bytes: u64,
    /// Number of items renamed to avoid sibling collisions.
    pub renamed: usize,
}

/// Progress update for a single file download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Remote file id.
    pub item_id: String,
    /// Local destination.
    pub path: PathBuf,
    /// Bytes written so far.
    pub bytes_written: u64,
    /// Total size, when known.
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Fraction done in `0.0..=1.0`. Unknown totals report 0 until finished.
    pub fn fraction(&self) -> f64 {
        match self.total_bytes {
            Some(0) => 1.0,
            Some(total) => (self.bytes_written as f64 / total as f64).min(1.0),
            None => 0.0,
        }
    }
}
