//! Error types for remote storage access.

use thiserror::Error;

/// Errors returned by a [`RemoteStorage`](super::RemoteStorage) backend.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The API answered with a non-success status.
    #[error("Remote API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The item does not exist or is not visible with the configured credentials.
    #[error("Remote item not found: {id}")]
    NotFound { id: String },

    /// The request never produced a response (connect, timeout, TLS...).
    #[error("Remote transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Failed to decode remote response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
