//! Conversion sessions.
//!
//! A trigger (share link or uploaded file) becomes one [`ConversionSession`]
//! with its own staging directory. The [`ConversionService`] drives it
//! through materialization and hashing and applies the cleanup policy.

mod error;
mod service;
mod types;

pub use error::ConversionError;
pub use service::{ConversionContext, ConversionService};
pub use types::{ConversionOutcome, ConversionSession, SessionStatus};
