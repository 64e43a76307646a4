//! Types for the torrent module.

use serde::{Deserialize, Serialize};

/// Length of one SHA-1 piece digest.
pub const PIECE_HASH_LEN: usize = 20;

/// One file of the artifact, relative to the content root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path components below the root. For a single-file artifact this is
    /// just the file name.
    pub relative_path: Vec<String>,
    pub length: u64,
}

impl FileEntry {
    pub fn new(relative_path: Vec<String>, length: u64) -> Self {
        Self {
            relative_path,
            length,
        }
    }

    /// Path joined with `/`.
    pub fn path_string(&self) -> String {
        self.relative_path.join("/")
    }
}

/// Hashed description of local content.
///
/// Derived only from the bytes and enumeration order of the content root,
/// so identical content always produces identical metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentMetadata {
    pub name: String,
    pub piece_length: u64,
    pub piece_hashes: Vec<[u8; PIECE_HASH_LEN]>,
    pub files: Vec<FileEntry>,
    pub total_length: u64,
    /// Root was a single file rather than a directory.
    pub single_file: bool,
    pub private: bool,
}

impl TorrentMetadata {
    pub fn piece_count(&self) -> usize {
        self.piece_hashes.len()
    }

    /// Digests concatenated in piece order.
    pub fn pieces_bytes(&self) -> Vec<u8> {
        self.piece_hashes.iter().flatten().copied().collect()
    }
}

/// What a standard torrent parser reads back from an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub name: String,
    /// Lowercase hex SHA-1 of the info dictionary.
    pub info_hash: String,
    pub files: Vec<FileEntry>,
    pub total_length: u64,
}
