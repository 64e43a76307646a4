//! Error types for share-link parsing.

use thiserror::Error;

/// Errors that can occur while extracting an item id from a share link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The input does not contain a recognizable Drive share link.
    #[error("Invalid Google Drive link: {input}")]
    InvalidLink { input: String },
}

impl LinkError {
    /// Creates an invalid link error, truncating very long inputs.
    pub fn invalid(input: &str) -> Self {
        Self::InvalidLink {
            input: input.chars().take(200).collect(),
        }
    }
}
