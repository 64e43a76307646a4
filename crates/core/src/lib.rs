pub mod config;
pub mod link;
pub mod metrics;
pub mod remote;
pub mod session;
pub mod staging;
pub mod testing;
pub mod torrent;
pub mod walker;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use link::{parse_link, ItemId, LinkError};
pub use remote::{DriveClient, RemoteError, RemoteItem, RemoteStorage};
pub use session::{
    ConversionContext, ConversionError, ConversionOutcome, ConversionService, SessionStatus,
};
pub use staging::{StagingArea, StagingDirectory, StagingError};
pub use torrent::{inspect, ArtifactSummary, TorrentBuilder, TorrentError, TorrentMetadata};
pub use walker::{TreeWalker, WalkError, WalkReport};
