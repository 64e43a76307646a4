//! Link parser: turns a Drive share link into a remote item id.

mod error;
mod parser;

pub use error::LinkError;
pub use parser::{parse_link, ItemId};
