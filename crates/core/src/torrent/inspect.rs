//! Reads an artifact back with librqbit-core.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};

use super::error::TorrentError;
use super::types::{ArtifactSummary, FileEntry};

/// Parses a `.torrent` file and summarizes it.
///
/// Supports both single-file and multi-file torrents. Non-UTF-8 names are
/// converted lossily.
pub fn inspect(bytes: &[u8]) -> Result<ArtifactSummary, TorrentError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| TorrentError::Parse(e.to_string()))?;

    let info = &torrent.info;

    let name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_default();

    let files = if let Some(ref files) = info.files {
        files
            .iter()
            .map(|file| {
                let parts = file
                    .path
                    .iter()
                    .map(|part| bytes_to_string(part.as_ref()))
                    .collect();
                FileEntry::new(parts, file.length)
            })
            .collect::<Vec<_>>()
    } else if let Some(length) = info.length {
        vec![FileEntry::new(vec![name.clone()], length)]
    } else {
        return Err(TorrentError::Parse("torrent has neither length nor files".to_string()));
    };

    Ok(ArtifactSummary {
        total_length: files.iter().map(|f| f.length).sum(),
        name,
        info_hash: torrent.info_hash.as_string(),
        files,
    })
}

fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
