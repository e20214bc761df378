use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub qbittorrent: QBittorrentConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Chat front-end configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token issued by the front-end.
    pub token: String,
    /// Only this chat may submit jobs. `None` accepts everyone.
    #[serde(default)]
    pub allowed_chat_id: Option<i64>,
    /// Long-poll timeout for inbound updates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

fn default_poll_timeout() -> u32 {
    30
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    #[serde(default = "default_qb_url")]
    pub url: String,
    #[serde(default = "default_qb_username")]
    pub username: String,
    #[serde(default = "default_qb_password")]
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// A login is skipped if the previous one happened less than this many seconds ago.
    #[serde(default = "default_login_cooldown")]
    pub login_cooldown_secs: u64,
}

impl Default for QBittorrentConfig {
    fn default() -> Self {
        Self {
            url: default_qb_url(),
            username: default_qb_username(),
            password: default_qb_password(),
            timeout_secs: default_timeout(),
            login_cooldown_secs: default_login_cooldown(),
        }
    }
}

fn default_qb_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_qb_username() -> String {
    "admin".to_string()
}

fn default_qb_password() -> String {
    "adminadmin".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_login_cooldown() -> u64 {
    60
}

/// Where the engine should place downloaded content
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    #[serde(default = "default_save_path")]
    pub save_path: String,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
        }
    }
}

fn default_save_path() -> String {
    "/downloads".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("torrelay.db")
}

/// Job watcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
    /// How often every stored job is polled.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Minimum gap between two progress notifications for the same job.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
    /// Delay before the first poll after startup.
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            progress_interval_secs: default_progress_interval(),
            startup_delay_secs: default_startup_delay(),
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}

fn default_progress_interval() -> u64 {
    60
}

fn default_startup_delay() -> u64 {
    3
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub qbittorrent: SanitizedQBittorrentConfig,
    pub downloads: DownloadsConfig,
    pub database: DatabaseConfig,
    pub watcher: WatcherConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub token_configured: bool,
    pub allowed_chat_id: Option<i64>,
    pub poll_timeout_secs: u32,
}

/// Sanitized qBittorrent config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
    pub login_cooldown_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            telegram: SanitizedTelegramConfig {
                token_configured: !config.telegram.token.is_empty(),
                allowed_chat_id: config.telegram.allowed_chat_id,
                poll_timeout_secs: config.telegram.poll_timeout_secs,
            },
            qbittorrent: SanitizedQBittorrentConfig {
                url: config.qbittorrent.url.clone(),
                username: config.qbittorrent.username.clone(),
                password_configured: !config.qbittorrent.password.is_empty(),
                timeout_secs: config.qbittorrent.timeout_secs,
                login_cooldown_secs: config.qbittorrent.login_cooldown_secs,
            },
            downloads: config.downloads.clone(),
            database: config.database.clone(),
            watcher: config.watcher.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let toml = r#"
[telegram]
token = "123:abc"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.telegram.allowed_chat_id, None);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.qbittorrent.url, "http://127.0.0.1:8080");
        assert_eq!(config.qbittorrent.username, "admin");
        assert_eq!(config.qbittorrent.login_cooldown_secs, 60);
        assert_eq!(config.downloads.save_path, "/downloads");
        assert_eq!(config.database.path.to_str().unwrap(), "torrelay.db");
        assert_eq!(config.watcher.poll_interval_secs, 10);
        assert_eq!(config.watcher.progress_interval_secs, 60);
        assert_eq!(config.watcher.startup_delay_secs, 3);
    }

    #[test]
    fn test_deserialize_missing_telegram_fails() {
        let toml = r#"
[downloads]
save_path = "/data"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[telegram]
token = "123:abc"
allowed_chat_id = -100200300

[qbittorrent]
url = "http://nas.local:8080/"
username = "bot"
password = "hunter2"
timeout_secs = 10
login_cooldown_secs = 120

[downloads]
save_path = "/mnt/media"

[database]
path = "/var/lib/torrelay/state.db"

[watcher]
poll_interval_secs = 15
progress_interval_secs = 300
startup_delay_secs = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.telegram.allowed_chat_id, Some(-100200300));
        assert_eq!(config.qbittorrent.username, "bot");
        assert_eq!(config.qbittorrent.timeout_secs, 10);
        assert_eq!(config.qbittorrent.login_cooldown_secs, 120);
        assert_eq!(config.downloads.save_path, "/mnt/media");
        assert_eq!(config.watcher.progress_interval_secs, 300);
        assert_eq!(config.watcher.startup_delay_secs, 0);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[telegram]
token = "123:abc"

[qbittorrent]
password = "hunter2"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.telegram.token_configured);
        assert!(sanitized.qbittorrent.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("123:abc"));
    }
}
