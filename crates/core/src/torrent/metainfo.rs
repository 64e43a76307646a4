//! Wire layout of a v1 metainfo file.
//!
//! The bencode serializer emits dictionary keys in sorted order, so field
//! declaration order here does not matter. Absent optional keys are skipped.

use librqbit_bencode::{bencode_serialize_to_writer, ByteBuf};
use serde::Serialize;

use super::error::TorrentError;
use super::types::TorrentMetadata;

#[derive(Debug, Serialize)]
struct MetainfoFile<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    announce: Option<&'a str>,
    #[serde(rename = "announce-list", skip_serializing_if = "Option::is_none")]
    announce_list: Option<Vec<Vec<&'a str>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(rename = "created by", skip_serializing_if = "Option::is_none")]
    created_by: Option<&'a str>,
    info: InfoDict<'a>,
}

#[derive(Debug, Serialize)]
struct InfoDict<'a> {
    name: &'a str,
    #[serde(rename = "piece length")]
    piece_length: u64,
    pieces: ByteBuf<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<u8>,
    /// Single-file mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u64>,
    /// Multi-file mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<FileDict<'a>>>,
}

#[derive(Debug, Serialize)]
struct FileDict<'a> {
    length: u64,
    path: &'a [String],
}

/// Top-level keys besides `info`. Empty values are left out.
#[derive(Debug, Default)]
pub struct Envelope<'a> {
    pub trackers: Vec<&'a str>,
    pub comment: Option<&'a str>,
    pub created_by: Option<&'a str>,
}

/// Bencodes `metadata` wrapped in `envelope`.
///
/// The first tracker becomes `announce`. `announce-list` is only written when
/// there is more than one, one tracker per tier.
pub fn encode(metadata: &TorrentMetadata, envelope: &Envelope<'_>) -> Result<Vec<u8>, TorrentError> {
    let pieces = metadata.pieces_bytes();

    let files = (!metadata.single_file).then(|| {
        metadata
            .files
            .iter()
            .map(|file| FileDict {
                length: file.length,
                path: &file.relative_path,
            })
            .collect()
    });

    let file = MetainfoFile {
        announce: envelope.trackers.first().copied(),
        announce_list: (envelope.trackers.len() > 1)
            .then(|| envelope.trackers.iter().map(|t| vec![*t]).collect()),
        comment: envelope.comment,
        created_by: envelope.created_by,
        info: InfoDict {
            name: &metadata.name,
            piece_length: metadata.piece_length,
            pieces: ByteBuf(&pieces),
            private: metadata.private.then_some(1),
            length: metadata.single_file.then_some(metadata.total_length),
            files,
        },
    };

    let mut out = Vec::new();
    bencode_serialize_to_writer(&file, &mut out)
        .map_err(|e| TorrentError::Encode(e.to_string()))?;
    Ok(out)
}
