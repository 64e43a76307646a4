//! Conversion service: runs a trigger end to end.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::fs;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::{Config, WalkerConfig};
use crate::link::{parse_link, ItemId};
use crate::metrics;
use crate::remote::{DriveClient, RemoteError, RemoteStorage};
use crate::staging::StagingArea;
use crate::torrent::{inspect, TorrentBuilder};
use crate::walker::{sanitize_name, DownloadProgress, TreeWalker};

use super::error::ConversionError;
use super::types::{ConversionOutcome, ConversionSession, SessionStatus};

const TRIGGER_LINK: &str = "link";
const TRIGGER_UPLOAD: &str = "upload";

/// Where uploaded content comes from.
enum Upload<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Everything a conversion needs, shared across concurrent sessions.
#[derive(Clone)]
pub struct ConversionContext {
    pub remote: Arc<dyn RemoteStorage>,
    pub staging: StagingArea,
    pub builder: TorrentBuilder,
    pub walker: WalkerConfig,
}

impl ConversionContext {
    /// Builds a context backed by the Drive API.
    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        let remote = DriveClient::new(config.drive.clone())?;
        Ok(Self::with_remote(config, Arc::new(remote)))
    }

    /// Builds a context around an existing remote backend.
    pub fn with_remote(config: &Config, remote: Arc<dyn RemoteStorage>) -> Self {
        Self {
            remote,
            staging: StagingArea::from_config(&config.staging),
            builder: TorrentBuilder::new(config.torrent.clone()),
            walker: config.walker.clone(),
        }
    }
}

/// Turns share links and uploads into `.torrent` artifacts.
///
/// Any failure after a staging directory is acquired removes it. On success
/// the directory stays and the caller owns it.
pub struct ConversionService {
    context: ConversionContext,
}

impl ConversionService {
    pub fn new(context: ConversionContext) -> Self {
        Self { context }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.context.staging
    }

    pub fn remote_name(&self) -> &str {
        self.context.remote.name()
    }

    /// Converts the item referenced by a share link found in `text`.
    pub async fn convert_link(&self, text: &str) -> Result<ConversionOutcome, ConversionError> {
        self.run_link(text, None).await
    }

    /// Like [`convert_link`](Self::convert_link), reporting download progress.
    pub async fn convert_link_with_progress(
        &self,
        text: &str,
        progress_tx: mpsc::Sender<DownloadProgress>,
    ) -> Result<ConversionOutcome, ConversionError> {
        self.run_link(text, Some(progress_tx)).await
    }

    /// Converts an uploaded file, copying it into the session's staging directory.
    pub async fn convert_upload(
        &self,
        upload_path: &Path,
        original_name: &str,
    ) -> Result<ConversionOutcome, ConversionError> {
        let start = Instant::now();
        let result = self.run_upload(Upload::Path(upload_path), original_name).await;
        record(TRIGGER_UPLOAD, start, &result);
        result
    }

    /// Converts an upload held in memory.
    pub async fn convert_upload_bytes(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<ConversionOutcome, ConversionError> {
        let start = Instant::now();
        let result = self.run_upload(Upload::Bytes(bytes), original_name).await;
        record(TRIGGER_UPLOAD, start, &result);
        result
    }

    async fn run_link(
        &self,
        text: &str,
        progress_tx: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<ConversionOutcome, ConversionError> {
        let start = Instant::now();
        let result = self.convert_remote(text, progress_tx).await;
        record(TRIGGER_LINK, start, &result);
        result
    }

    async fn convert_remote(
        &self,
        text: &str,
        progress_tx: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<ConversionOutcome, ConversionError> {
        // Parsed before acquiring so bad input never allocates.
        let item_id = parse_link(text)?;
        let mut session = self.open_session(TRIGGER_LINK).await?;
        let materialized = self
            .materialize_remote(&mut session, &item_id, progress_tx)
            .await;
        self.finish(session, materialized).await
    }

    async fn run_upload(
        &self,
        upload: Upload<'_>,
        original_name: &str,
    ) -> Result<ConversionOutcome, ConversionError> {
        let mut session = self.open_session(TRIGGER_UPLOAD).await?;
        session.transition(SessionStatus::Materializing);

        let dest = session
            .staging_directory
            .path()
            .join(sanitize_name(original_name));
        let placed = match upload {
            Upload::Path(source) => fs::copy(source, &dest)
                .await
                .map(|_| dest)
                .map_err(|e| ConversionError::local_io(source, e)),
            Upload::Bytes(bytes) => match fs::write(&dest, bytes).await {
                Ok(()) => Ok(dest),
                Err(e) => Err(ConversionError::local_io(&dest, e)),
            },
        };

        self.finish(session, placed).await
    }

    async fn open_session(&self, trigger: &str) -> Result<ConversionSession, ConversionError> {
        let dir = self.context.staging.acquire().await?;
        let session = ConversionSession::new(dir);
        info!(
            session_id = %session.id,
            trigger,
            staging_dir = %session.staging_directory.path().display(),
            "Conversion session started"
        );
        Ok(session)
    }

    async fn materialize_remote(
        &self,
        session: &mut ConversionSession,
        item_id: &ItemId,
        progress_tx: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<PathBuf, ConversionError> {
        session.transition(SessionStatus::Materializing);
        info!(session_id = %session.id, item_id = %item_id, "Materializing remote item");

        let walker = TreeWalker::new(self.context.remote.clone(), &self.context.walker);
        let destination = session.staging_directory.path();
        let report = match progress_tx {
            Some(tx) => walker.walk_with_progress(item_id.as_str(), destination, tx).await?,
            None => walker.walk(item_id.as_str(), destination).await?,
        };

        Ok(report.root_local_path)
    }

    /// Builds the artifact from materialized content, or cleans up on failure.
    async fn finish(
        &self,
        mut session: ConversionSession,
        materialized: Result<PathBuf, ConversionError>,
    ) -> Result<ConversionOutcome, ConversionError> {
        let outcome = match materialized {
            Ok(content_path) => self.build_artifact(&mut session, content_path).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => {
                session.transition(SessionStatus::Completed);
                self.context
                    .staging
                    .mark_finished(&session.staging_directory)
                    .await;
                info!(
                    session_id = %session.id,
                    artifact = %outcome.artifact_path.display(),
                    info_hash = %outcome.info_hash,
                    total_length = outcome.metadata.total_length,
                    "Conversion completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                session.transition(SessionStatus::Failed);
                error!(session_id = %session.id, kind = e.kind(), error = %e, "Conversion failed");

                if let Err(release_err) = self.context.staging.release(session.staging_directory).await {
                    warn!(
                        path = ?release_err.path(),
                        error = %release_err,
                        "Failed to release staging directory"
                    );
                }
                Err(e)
            }
        }
    }

    async fn build_artifact(
        &self,
        session: &mut ConversionSession,
        content_path: PathBuf,
    ) -> Result<ConversionOutcome, ConversionError> {
        session.root_local_path = Some(content_path.clone());
        session.transition(SessionStatus::Building);

        let builder = self.context.builder.clone();
        let hash_root = content_path.clone();
        let metadata = tokio::task::spawn_blocking(move || builder.build(&hash_root))
            .await
            .map_err(|e| {
                ConversionError::local_io(&content_path, std::io::Error::other(e.to_string()))
            })??;

        let bytes = self.context.builder.to_bytes(&metadata)?;
        let staging_dir = session.staging_directory.path().to_path_buf();
        let artifact_path = staging_dir.join(format!("{}.torrent", metadata.name));
        fs::write(&artifact_path, &bytes)
            .await
            .map_err(|e| ConversionError::local_io(&artifact_path, e))?;

        let summary = inspect(&bytes)?;

        Ok(ConversionOutcome {
            session_id: session.id.clone(),
            staging_dir,
            content_path,
            artifact_path,
            metadata,
            info_hash: summary.info_hash,
            started_at: session.started_at,
        })
    }
}

fn record(trigger: &str, start: Instant, result: &Result<ConversionOutcome, ConversionError>) {
    let label = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::CONVERSIONS_TOTAL
        .with_label_values(&[trigger, label])
        .inc();
    metrics::CONVERSION_DURATION
        .with_label_values(&[trigger])
        .observe(start.elapsed().as_secs_f64());
}
