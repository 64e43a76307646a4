//! Error types for the staging module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while managing staging directories.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Failed to create the shared staging root.
    #[error("Failed to create staging root: {path}")]
    RootCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a session directory.
    #[error("Failed to create staging directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every generated name was already taken.
    #[error("No unique staging directory after {attempts} attempts")]
    NamesExhausted { attempts: usize },

    /// Failed to remove a session directory.
    #[error("Failed to remove staging directory: {path}")]
    RemovalFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to scan the staging root.
    #[error("Failed to scan staging root: {path}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StagingError {
    /// Returns the path involved, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::RootCreationFailed { path, .. }
            | Self::DirectoryCreationFailed { path, .. }
            | Self::RemovalFailed { path, .. }
            | Self::ScanFailed { path, .. } => Some(path),
            Self::NamesExhausted { .. } => None,
        }
    }
}
