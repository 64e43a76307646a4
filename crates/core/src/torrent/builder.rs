//! Torrent builder: enumerates local content, hashes pieces, serializes.

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::TorrentConfig;
use crate::metrics;

use super::error::TorrentError;
use super::metainfo::{encode, Envelope};
use super::types::{FileEntry, TorrentMetadata, PIECE_HASH_LEN};

/// Smallest piece length accepted.
pub const MIN_PIECE_LENGTH: u64 = 16 * 1024;

const AUTO_MIN_PIECE_LENGTH: u64 = 256 * 1024;
const AUTO_MAX_PIECE_LENGTH: u64 = 16 * 1024 * 1024;
const AUTO_TARGET_MAX_PIECES: u64 = 1500;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Picks a piece length for `total_length` bytes of content.
///
/// Smallest power of two keeping the piece count at or below 1500, clamped to
/// 256 KiB..=16 MiB.
pub fn auto_piece_length(total_length: u64) -> u64 {
    let mut length = AUTO_MIN_PIECE_LENGTH;
    while length < AUTO_MAX_PIECE_LENGTH && total_length.div_ceil(length) > AUTO_TARGET_MAX_PIECES {
        length *= 2;
    }
    length
}

/// Checks a configured piece length.
pub fn validate_piece_length(length: u64) -> Result<(), TorrentError> {
    if length < MIN_PIECE_LENGTH || !length.is_power_of_two() {
        return Err(TorrentError::InvalidPieceLength {
            length,
            min: MIN_PIECE_LENGTH,
        });
    }
    Ok(())
}

/// A file found under the content root, in enumeration order.
struct SourceFile {
    path: PathBuf,
    relative_path: Vec<String>,
}

/// Builds BitTorrent v1 metainfo from a local file or directory.
#[derive(Debug, Clone, Default)]
pub struct TorrentBuilder {
    config: TorrentConfig,
}

impl TorrentBuilder {
    pub fn new(config: TorrentConfig) -> Self {
        Self { config }
    }

    /// Hashes the content at `root` into metadata.
    ///
    /// Blocking; async callers should run it on a blocking thread.
    pub fn build(&self, root: &Path) -> Result<TorrentMetadata, TorrentError> {
        let start = Instant::now();

        let root_meta = std::fs::metadata(root).map_err(|e| TorrentError::io(root, e))?;
        let name = root
            .file_name()
            .ok_or_else(|| TorrentError::InvalidPath {
                path: root.to_path_buf(),
            })?
            .to_str()
            .ok_or_else(|| TorrentError::InvalidPath {
                path: root.to_path_buf(),
            })?
            .to_string();

        let single_file = root_meta.is_file();
        let sources = if single_file {
            vec![SourceFile {
                path: root.to_path_buf(),
                relative_path: vec![name.clone()],
            }]
        } else {
            enumerate_files(root)?
        };

        if sources.is_empty() {
            return Err(TorrentError::NoFiles {
                path: root.to_path_buf(),
            });
        }

        let declared_total: u64 = sources
            .iter()
            .map(|s| std::fs::metadata(&s.path).map(|m| m.len()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TorrentError::io(root, e))?
            .into_iter()
            .sum();

        let piece_length = match self.config.piece_length {
            Some(length) => {
                validate_piece_length(length)?;
                length
            }
            None => auto_piece_length(declared_total),
        };

        debug!(
            root = %root.display(),
            files = sources.len(),
            bytes = declared_total,
            piece_length,
            "Hashing content"
        );

        let mut hasher = PieceHasher::new(piece_length);
        let mut files = Vec::with_capacity(sources.len());
        for source in sources {
            let length = hasher.hash_file(&source.path)?;
            files.push(FileEntry::new(source.relative_path, length));
        }
        let (piece_hashes, total_length) = hasher.finish();

        metrics::HASHING_DURATION.observe(start.elapsed().as_secs_f64());

        info!(
            name = %name,
            files = files.len(),
            total_length,
            pieces = piece_hashes.len(),
            "Built torrent metadata"
        );

        Ok(TorrentMetadata {
            name,
            piece_length,
            piece_hashes,
            files,
            total_length,
            single_file,
            private: self.config.private,
        })
    }

    /// Serializes metadata to a bencoded metainfo file.
    ///
    /// Output contains no timestamps, so equal metadata gives equal bytes.
    pub fn to_bytes(&self, metadata: &TorrentMetadata) -> Result<Vec<u8>, TorrentError> {
        let envelope = Envelope {
            trackers: self
                .config
                .trackers
                .iter()
                .map(String::as_str)
                .filter(|t| !t.is_empty())
                .collect(),
            comment: self.config.comment.as_deref().filter(|c| !c.is_empty()),
            created_by: Some(self.config.created_by.as_str()).filter(|c| !c.is_empty()),
        };
        encode(metadata, &envelope)
    }
}

/// Regular files under `root`, sorted by name at every level.
///
/// Symlinks are not followed and are skipped.
fn enumerate_files(root: &Path) -> Result<Vec<SourceFile>, TorrentError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            TorrentError::io(path, e.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| TorrentError::InvalidPath {
                path: entry.path().to_path_buf(),
            })?;

        let relative_path = relative
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .map(String::from)
                    .ok_or_else(|| TorrentError::InvalidPath {
                        path: entry.path().to_path_buf(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        files.push(SourceFile {
            path: entry.into_path(),
            relative_path,
        });
    }

    Ok(files)
}

/// Hashes a byte stream spanning many files into fixed-size pieces.
struct PieceHasher {
    piece_length: u64,
    hasher: Sha1,
    filled: u64,
    pieces: Vec<[u8; PIECE_HASH_LEN]>,
    total: u64,
    buf: Vec<u8>,
}

impl PieceHasher {
    fn new(piece_length: u64) -> Self {
        Self {
            piece_length,
            hasher: Sha1::new(),
            filled: 0,
            pieces: Vec::new(),
            total: 0,
            buf: vec![0u8; READ_BUFFER_SIZE],
        }
    }

    /// Feeds one file, returning the number of bytes read from it.
    fn hash_file(&mut self, path: &Path) -> Result<u64, TorrentError> {
        let mut file = File::open(path).map_err(|e| TorrentError::io(path, e))?;
        let mut length = 0u64;

        loop {
            let n = match file.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TorrentError::io(path, e)),
            };
            length += n as u64;

            let mut offset = 0;
            while offset < n {
                let room = (self.piece_length - self.filled) as usize;
                let take = room.min(n - offset);
                self.hasher.update(&self.buf[offset..offset + take]);
                self.filled += take as u64;
                offset += take;

                if self.filled == self.piece_length {
                    self.pieces.push(self.hasher.finalize_reset().into());
                    self.filled = 0;
                }
            }
        }

        self.total += length;
        Ok(length)
    }

    fn finish(mut self) -> (Vec<[u8; PIECE_HASH_LEN]>, u64) {
        if self.filled > 0 {
            self.pieces.push(self.hasher.finalize().into());
        }
        (self.pieces, self.total)
    }
}
