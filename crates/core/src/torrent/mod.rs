//! Torrent builder: local content to a BitTorrent v1 metainfo artifact.
//!
//! Files are enumerated depth-first, sorted by name at every level, and the
//! concatenated byte stream is split into SHA-1 hashed pieces. Serialization
//! emits no timestamps, so identical content yields identical bytes.

mod builder;
mod error;
mod inspect;
mod metainfo;
mod types;

pub use builder::{auto_piece_length, validate_piece_length, TorrentBuilder, MIN_PIECE_LENGTH};
pub use error::TorrentError;
pub use inspect::inspect;
pub use types::{ArtifactSummary, FileEntry, TorrentMetadata, PIECE_HASH_LEN};
