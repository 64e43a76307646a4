//! Staging area manager.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StagingConfig;

use super::error::StagingError;

/// Prefix of every session directory under the root.
pub const STAGING_DIR_PREFIX: &str = "conv-";

const MAX_ACQUIRE_ATTEMPTS: usize = 8;

/// A uniquely named directory owned by one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingDirectory {
    id: String,
    path: PathBuf,
    created_at: DateTime<Utc>,
}

impl StagingDirectory {
    /// The unique suffix of the directory name.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Allocates and removes per-conversion directories under a shared root.
///
/// Clones share the set of in-flight directories, which sweeps never touch.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
    active: Arc<Mutex<HashSet<PathBuf>>>,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn from_config(config: &StagingConfig) -> Self {
        Self::new(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a fresh, previously nonexistent directory under the root.
    pub async fn acquire(&self) -> Result<StagingDirectory, StagingError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StagingError::RootCreationFailed {
                path: self.root.clone(),
                source: e,
            })?;

        for _ in 0..MAX_ACQUIRE_ATTEMPTS {
            let id = Uuid::new_v4().simple().to_string();
            let path = self.root.join(format!("{}{}", STAGING_DIR_PREFIX, id));

            // Non-recursive so an existing directory is never reused.
            match fs::create_dir(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Acquired staging directory");
                    self.active.lock().await.insert(path.clone());
                    return Ok(StagingDirectory {
                        id,
                        path,
                        created_at: Utc::now(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(path = %path.display(), "Staging directory name collision, retrying");
                }
                Err(e) => {
                    return Err(StagingError::DirectoryCreationFailed { path, source: e });
                }
            }
        }

        Err(StagingError::NamesExhausted {
            attempts: MAX_ACQUIRE_ATTEMPTS,
        })
    }

    /// Marks a directory's session as done. From now on it ages like any
    /// other directory and can be swept.
    pub async fn mark_finished(&self, dir: &StagingDirectory) {
        self.active.lock().await.remove(&dir.path);
    }

    /// Whether a session still holds this directory.
    pub async fn is_active(&self, dir: &StagingDirectory) -> bool {
        self.active.lock().await.contains(&dir.path)
    }

    /// Removes a directory and everything in it. Missing directories are fine.
    pub async fn release(&self, dir: StagingDirectory) -> Result<(), StagingError> {
        self.active.lock().await.remove(&dir.path);
        match fs::remove_dir_all(&dir.path).await {
            Ok(()) => {
                debug!(path = %dir.path.display(), "Released staging directory");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StagingError::RemovalFailed {
                path: dir.path,
                source: e,
            }),
        }
    }

    /// Removes finished session directories last modified more than `age` ago.
    ///
    /// Directories of in-flight sessions are skipped whatever their age.
    /// Returns how many were removed. Entries that vanish mid-sweep are skipped.
    pub async fn sweep_older_than(&self, age: Duration) -> Result<usize, StagingError> {
        let scan_err = |e| StagingError::ScanFailed {
            path: self.root.clone(),
            source: e,
        };

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(scan_err(e)),
        };

        let cutoff = SystemTime::now().checked_sub(age).unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await.map_err(scan_err)? {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(STAGING_DIR_PREFIX) {
                continue;
            }

            let path = entry.path();
            if self.active.lock().await.contains(&path) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(_) => continue,
            };
            if modified > cutoff {
                continue;
            }

            match fs::remove_dir_all(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StagingError::RemovalFailed { path, source: e }),
            }
        }

        if removed > 0 {
            info!(removed, root = %self.root.display(), "Swept expired staging directories");
        }
        Ok(removed)
    }
}
