//! Share-link parsing.
//!
//! Pure string matching; never touches the network.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::LinkError;

/// Drive/Docs URLs anywhere in the input, up to the next whitespace.
static SHARE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:drive|docs)\.google\.com/\S+").expect("share url pattern")
});

/// `/d/<id>` (files) and `/folders/<id>` (folders).
static PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:d|folders)/([A-Za-z0-9_-]+)").expect("path id pattern"));

/// Legacy `open?id=<id>` and `uc?id=<id>` forms.
static QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("query id pattern"));

/// Opaque identifier of a remote item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract the remote item id from text containing a Drive share link.
///
/// Whether the id names a file or a folder is not decided here; the walker
/// learns that from the item's metadata. The first recognizable link in the
/// input wins, so a whole chat message can be passed as-is.
///
/// # Examples
///
/// ```
/// use driveseed_core::link::parse_link;
///
/// let id = parse_link("https://drive.google.com/drive/folders/1AbC_d-9?usp=sharing").unwrap();
/// assert_eq!(id.as_str(), "1AbC_d-9");
/// ```
pub fn parse_link(input: &str) -> Result<ItemId, LinkError> {
    SHARE_URL
        .find_iter(input)
        .find_map(|url| extract_id(url.as_str()))
        .ok_or_else(|| LinkError::invalid(input))
}

fn extract_id(url: &str) -> Option<ItemId> {
    PATH_ID
        .captures(url)
        .or_else(|| QUERY_ID.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| ItemId::new(m.as_str()))
}
