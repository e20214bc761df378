//! Types for remote engine operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RejectReason;

/// Errors that can occur while talking to the remote engine.
#[derive(Debug, Error)]
pub enum RemoteClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Add rejected (HTTP {status}): {reason}")]
    SubmitRejected { status: u16, reason: RejectReason },

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

impl RemoteClientError {
    /// Map a transport failure from reqwest.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteClientError::Timeout
        } else if e.is_connect() {
            RemoteClientError::ConnectionFailed(e.to_string())
        } else {
            RemoteClientError::ApiError(e.to_string())
        }
    }
}

/// Status of one engine entry carrying a job's tag.
///
/// A single job may map to several entries, e.g. a magnet that expands into
/// more than one torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentStatus {
    /// Torrent name as reported by the engine.
    pub name: String,
    /// Completion ratio (0.0 - 1.0).
    pub progress: f64,
    /// Current download rate in bytes/second.
    pub download_rate: u64,
}

impl TorrentStatus {
    pub fn new(name: impl Into<String>, progress: f64, download_rate: u64) -> Self {
        Self {
            name: name.into(),
            progress,
            download_rate,
        }
    }

    /// Whether the engine reports this entry as fully downloaded.
    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    /// Progress as a percentage.
    pub fn percent(&self) -> f64 {
        self.progress * 100.0
    }
}

/// Trait for remote engine backends.
///
/// All operations authenticate transparently before running.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Establish (or reuse) an authenticated session.
    async fn login(&self) -> Result<(), RemoteClientError>;

    /// Add a magnet URI, tagged with `tag`, saving into `save_path`.
    async fn submit_magnet(
        &self,
        uri: &str,
        tag: &str,
        save_path: &str,
    ) -> Result<(), RemoteClientError>;

    /// Upload a .torrent file, tagged with `tag`, saving into `save_path`.
    ///
    /// The caller is responsible for checking the file extension.
    async fn submit_file(
        &self,
        file_name: &str,
        content: Vec<u8>,
        tag: &str,
        save_path: &str,
    ) -> Result<(), RemoteClientError>;

    /// List the entries carrying `tag`.
    ///
    /// A non-success status or an unparseable body yields an empty list rather
    /// than an error; only transport and authentication failures are errors.
    async fn query_by_tag(&self, tag: &str) -> Result<Vec<TorrentStatus>, RemoteClientError>;
}
