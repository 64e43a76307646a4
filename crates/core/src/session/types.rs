//! Types for conversion sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::staging::StagingDirectory;
use crate::torrent::TorrentMetadata;

/// Lifecycle of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Staging directory allocated.
    Staging,
    /// Content is being downloaded or placed.
    Materializing,
    /// Pieces are being hashed.
    Building,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Materializing => "materializing",
            Self::Building => "building",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One trigger's conversion, bound to its own staging directory.
#[derive(Debug)]
pub struct ConversionSession {
    pub id: String,
    pub staging_directory: StagingDirectory,
    pub root_local_path: Option<PathBuf>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
}

impl ConversionSession {
    pub fn new(staging_directory: StagingDirectory) -> Self {
        Self {
            id: staging_directory.id().to_string(),
            staging_directory,
            root_local_path: None,
            status: SessionStatus::Staging,
            started_at: Utc::now(),
        }
    }

    pub fn transition(&mut self, status: SessionStatus) {
        debug!(
            session_id = %self.id,
            from = self.status.as_str(),
            to = status.as_str(),
            "Session transition"
        );
        self.status = status;
    }
}

/// Result of a successful conversion.
///
/// The staging directory is left in place and now belongs to the caller.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub session_id: String,
    pub staging_dir: PathBuf,
    /// Local root of the converted content (file or folder).
    pub content_path: PathBuf,
    pub artifact_path: PathBuf,
    pub metadata: TorrentMetadata,
    /// Lowercase hex info hash.
    pub info_hash: String,
    pub started_at: DateTime<Utc>,
}

impl ConversionOutcome {
    /// File name of the artifact, e.g. `Album.torrent`.
    pub fn artifact_name(&self) -> String {
        format!("{}.torrent", self.metadata.name)
    }
}
