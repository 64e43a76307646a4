//! Staging area manager.
//!
//! Every conversion gets its own `conv-<uuid>` directory under a shared root.
//! Callers release it on failure; on success it outlives the conversion.

mod area;
mod error;

pub use area::{StagingArea, StagingDirectory, STAGING_DIR_PREFIX};
pub use error::StagingError;
