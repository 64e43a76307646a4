use super::{types::Config, ConfigError};
use crate::torrent::MIN_PIECE_LENGTH;

/// Validate configuration
/// Currently validates:
/// - Server port and upload limit are not 0
/// - Drive paging and chunking are within API limits
/// - Walker depth is positive
/// - A fixed piece length is a power of two of at least 16 KiB
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    if config.staging.root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "staging.root cannot be empty".to_string(),
        ));
    }

    if !(1..=1000).contains(&config.drive.page_size) {
        return Err(ConfigError::ValidationError(format!(
            "drive.page_size must be between 1 and 1000, got {}",
            config.drive.page_size
        )));
    }

    if config.drive.chunk_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "drive.chunk_size_bytes cannot be 0".to_string(),
        ));
    }

    if config.drive.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "drive.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.walker.max_depth == 0 {
        return Err(ConfigError::ValidationError(
            "walker.max_depth cannot be 0".to_string(),
        ));
    }

    if let Some(piece_length) = config.torrent.piece_length {
        if piece_length < MIN_PIECE_LENGTH || !piece_length.is_power_of_two() {
            return Err(ConfigError::ValidationError(format!(
                "torrent.piece_length must be a power of two >= {}, got {}",
                MIN_PIECE_LENGTH, piece_length
            )));
        }
    }

    Ok(())
}
