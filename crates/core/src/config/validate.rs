use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Front-end token is present (the section itself is enforced by serde)
/// - qBittorrent URL is not empty
/// - Save path is not empty
/// - Watcher poll interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "telegram.token cannot be empty".to_string(),
        ));
    }

    if config.qbittorrent.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "qbittorrent.url cannot be empty".to_string(),
        ));
    }

    if config.downloads.save_path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloads.save_path cannot be empty".to_string(),
        ));
    }

    if config.watcher.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "watcher.poll_interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
