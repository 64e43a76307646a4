use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub walker: WalkerConfig,
    #[serde(default)]
    pub torrent: TorrentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    512 * 1024 * 1024
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Where conversion sessions get their scratch directories.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    #[serde(default = "default_staging_root")]
    pub root: PathBuf,
    /// When set, successful sessions older than this are swept periodically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_secs: Option<u64>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            root: default_staging_root(),
            retention_secs: None,
        }
    }
}

fn default_staging_root() -> PathBuf {
    PathBuf::from("temp_downloads")
}

/// Google Drive v3 client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriveConfig {
    /// Base URL of the Drive v3 REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// API key, sent as the `key` query parameter.
    #[serde(default)]
    pub api_key: Option<String>,
    /// OAuth access token, sent as a bearer token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Children requested per listing page (Drive caps this at 1000).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Bytes requested per ranged content download.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
            access_token: None,
            page_size: default_page_size(),
            chunk_size_bytes: default_chunk_size(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_chunk_size() -> u64 {
    8 * 1024 * 1024 // 8 MiB
}

fn default_timeout() -> u32 {
    60
}

/// Remote tree walker limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalkerConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

/// Metainfo generation options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentConfig {
    /// Fixed piece length; derived from the content size when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece_length: Option<u64>,
    /// Tracker URLs. The first becomes `announce`, all of them `announce-list`.
    #[serde(default)]
    pub trackers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default = "default_created_by")]
    pub created_by: String,
}

impl Default for TorrentConfig {
    fn default() -> Self {
        Self {
            piece_length: None,
            trackers: Vec::new(),
            comment: None,
            private: false,
            created_by: default_created_by(),
        }
    }
}

fn default_created_by() -> String {
    format!("driveseed/{}", env!("CARGO_PKG_VERSION"))
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub staging: StagingConfig,
    pub drive: SanitizedDriveConfig,
    pub walker: WalkerConfig,
    pub torrent: TorrentConfig,
}

/// Sanitized Drive config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDriveConfig {
    pub api_base_url: String,
    pub api_key_configured: bool,
    pub access_token_configured: bool,
    pub page_size: u32,
    pub chunk_size_bytes: u64,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            staging: config.staging.clone(),
            drive: SanitizedDriveConfig {
                api_base_url: config.drive.api_base_url.clone(),
                api_key_configured: config
                    .drive
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                access_token_configured: config
                    .drive
                    .access_token
                    .as_ref()
                    .is_some_and(|t| !t.is_empty()),
                page_size: config.drive.page_size,
                chunk_size_bytes: config.drive.chunk_size_bytes,
                timeout_secs: config.drive.timeout_secs,
            },
            walker: config.walker.clone(),
            torrent: config.torrent.clone(),
        }
    }
}
