//! Remote tree walker: materializes a remote item into a local mirror.
//!
//! Folders are traversed depth-first in listing order with an explicit work
//! stack. Every failure aborts the walk; there is no partial-success mode.

mod error;
mod naming;
mod tree_walker;
mod types;

pub use error::WalkError;
pub use naming::sanitize_name;
pub use tree_walker::TreeWalker;
pub use types::{DownloadProgress, WalkReport};
