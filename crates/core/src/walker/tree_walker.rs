//! Remote tree walker implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::WalkerConfig;
use crate::metrics;
use crate::remote::{RemoteItem, RemoteStorage};

use super::error::WalkError;
use super::naming::{sanitize_name, SiblingNames};
use super::types::{DownloadProgress, WalkReport};

/// A remote item waiting to be materialized at `local_path`.
struct PendingItem {
    item: RemoteItem,
    local_path: PathBuf,
    depth: usize,
}

/// Mirrors a remote file or folder tree into a local directory.
pub struct TreeWalker {
    remote: Arc<dyn RemoteStorage>,
    max_depth: usize,
}

impl TreeWalker {
    pub fn new(remote: Arc<dyn RemoteStorage>, config: &WalkerConfig) -> Self {
        Self {
            remote,
            max_depth: config.max_depth,
        }
    }

    /// Walks `root_id` into `destination`, which must already exist.
    pub async fn walk(&self, root_id: &str, destination: &Path) -> Result<WalkReport, WalkError> {
        self.run_walk(root_id, destination, None).await
    }

    /// Like [`walk`](Self::walk), reporting per-file download progress.
    ///
    /// Updates are dropped when the channel is full.
    pub async fn walk_with_progress(
        &self,
        root_id: &str,
        destination: &Path,
        progress_tx: mpsc::Sender<DownloadProgress>,
    ) -> Result<WalkReport, WalkError> {
        self.run_walk(root_id, destination, Some(progress_tx)).await
    }

    async fn run_walk(
        &self,
        root_id: &str,
        destination: &Path,
        progress_tx: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<WalkReport, WalkError> {
        let root = self
            .remote
            .get_metadata(root_id)
            .await
            .map_err(|e| WalkError::remote(root_id, e))?;

        let root_local_path = destination.join(sanitize_name(&root.name));
        info!(
            item_id = %root.id,
            name = %root.name,
            is_folder = root.is_folder(),
            path = %root_local_path.display(),
            "Starting remote walk"
        );

        let mut report = WalkReport {
            root_local_path: root_local_path.clone(),
            ..Default::default()
        };

        let mut stack = vec![PendingItem {
            item: root,
            local_path: root_local_path,
            depth: 0,
        }];

        while let Some(pending) = stack.pop() {
            if pending.depth > self.max_depth {
                return Err(WalkError::DepthExceeded {
                    item_id: pending.item.id,
                    max_depth: self.max_depth,
                });
            }

            if !pending.item.is_folder() {
                let bytes = self
                    .download_file(&pending.item, &pending.local_path, progress_tx.as_ref())
                    .await?;
                report.files += 1;
                report.bytes += bytes;
                continue;
            }

            fs::create_dir(&pending.local_path)
                .await
                .map_err(|e| WalkError::local_io(&pending.local_path, e))?;
            report.folders += 1;

            let children = self.list_all_children(&pending.item.id).await?;
            debug!(
                folder_id = %pending.item.id,
                children = children.len(),
                path = %pending.local_path.display(),
                "Listed folder"
            );

            let mut names = SiblingNames::new();
            let mut resolved = Vec::with_capacity(children.len());
            for child in children {
                let (name, renamed) = names.claim(&sanitize_name(&child.name));
                if renamed {
                    debug!(item_id = %child.id, original = %child.name, local = %name, "Renamed colliding sibling");
                    report.renamed += 1;
                }
                resolved.push(PendingItem {
                    local_path: pending.local_path.join(name),
                    item: child,
                    depth: pending.depth + 1,
                });
            }

            // Reversed so children pop in listing order.
            stack.extend(resolved.into_iter().rev());
        }

        info!(
            files = report.files,
            folders = report.folders,
            bytes = report.bytes,
            renamed = report.renamed,
            "Remote walk completed"
        );

        Ok(report)
    }

    /// Collects every child of a folder across all listing pages.
    async fn list_all_children(&self, folder_id: &str) -> Result<Vec<RemoteItem>, WalkError> {
        let mut children = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .remote
                .list_children(folder_id, page_token.as_deref())
                .await
                .map_err(|e| WalkError::remote(folder_id, e))?;

            children.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(children)
    }

    /// Streams one file to disk, returning the number of bytes written.
    async fn download_file(
        &self,
        item: &RemoteItem,
        path: &Path,
        progress_tx: Option<&mpsc::Sender<DownloadProgress>>,
    ) -> Result<u64, WalkError> {
        let mut stream = self
            .remote
            .open_content(&item.id)
            .await
            .map_err(|e| WalkError::remote(&item.id, e))?;

        let file = File::create(path)
            .await
            .map_err(|e| WalkError::local_io(path, e))?;
        let mut writer = BufWriter::new(file);

        let total_bytes = stream.total_bytes();
        let mut bytes_written = 0u64;

        while let Some(chunk) = stream
            .next_chunk()
            .await
            .map_err(|e| WalkError::remote(&item.id, e))?
        {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| WalkError::local_io(path, e))?;
            bytes_written += chunk.len() as u64;

            if let Some(tx) = progress_tx {
                let _ = tx.try_send(DownloadProgress {
                    item_id: item.id.clone(),
                    path: path.to_path_buf(),
                    bytes_written,
                    total_bytes,
                });
            }
        }

        writer
            .flush()
            .await
            .map_err(|e| WalkError::local_io(path, e))?;

        // Empty files and streams without a known size never reached 1.0 above.
        if total_bytes != Some(bytes_written) || bytes_written == 0 {
            if let Some(tx) = progress_tx {
                let _ = tx.try_send(DownloadProgress {
                    item_id: item.id.clone(),
                    path: path.to_path_buf(),
                    bytes_written,
                    total_bytes: Some(bytes_written),
                });
            }
        }

        metrics::REMOTE_FILES_DOWNLOADED.inc();
        metrics::REMOTE_BYTES_DOWNLOADED.inc_by(bytes_written);

        debug!(item_id = %item.id, bytes = bytes_written, path = %path.display(), "Downloaded file");
        Ok(bytes_written)
    }
}
