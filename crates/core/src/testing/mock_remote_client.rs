//! Mock remote engine client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::remote::{RemoteClient, RemoteClientError, TorrentStatus};

/// What kind of add was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionKind {
    Magnet { uri: String },
    File { file_name: String, size: usize },
}

/// A recorded submit call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub kind: SubmissionKind,
    pub tag: String,
    pub save_path: String,
}

/// Mock implementation of the RemoteClient trait.
///
/// Provides controllable behavior for testing:
/// - Track submissions for assertions
/// - Control per-tag status lists and progress
/// - Simulate rejected adds, silent drops and failing queries
///
/// By default an accepted submission registers one entry at 0% under its tag,
/// the way the real engine would.
#[derive(Debug, Default)]
pub struct MockRemoteClient {
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    statuses: Arc<RwLock<HashMap<String, Vec<TorrentStatus>>>>,
    /// If set, the next submit fails with this error.
    next_submit_error: Arc<RwLock<Option<RemoteClientError>>>,
    /// Tags whose queries fail with a transport error.
    failing_queries: Arc<RwLock<HashSet<String>>>,
    /// Accept submissions with 200 but register nothing.
    drop_submissions: Arc<RwLock<bool>>,
    logins: Arc<RwLock<u32>>,
    queries: Arc<RwLock<u32>>,
}

impl MockRemoteClient {
    /// Create a new mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded submissions.
    pub async fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Replace the entries reported for `tag`.
    pub async fn set_statuses(&self, tag: &str, statuses: Vec<TorrentStatus>) {
        self.statuses.write().await.insert(tag.to_string(), statuses);
    }

    /// Set the progress of every entry under `tag`.
    pub async fn set_progress(&self, tag: &str, progress: f64) {
        if let Some(entries) = self.statuses.write().await.get_mut(tag) {
            for entry in entries.iter_mut() {
                entry.progress = progress.clamp(0.0, 1.0);
            }
        }
    }

    /// Configure the next submit to fail with the given error.
    pub async fn set_next_submit_error(&self, error: RemoteClientError) {
        *self.next_submit_error.write().await = Some(error);
    }

    /// Make submits succeed without anything showing up under the tag.
    pub async fn drop_submissions(&self, drop: bool) {
        *self.drop_submissions.write().await = drop;
    }

    /// Make queries for `tag` fail.
    pub async fn fail_queries_for(&self, tag: &str) {
        self.failing_queries.write().await.insert(tag.to_string());
    }

    /// Let queries for `tag` succeed again.
    pub async fn clear_query_failure(&self, tag: &str) {
        self.failing_queries.write().await.remove(tag);
    }

    pub async fn login_count(&self) -> u32 {
        *self.logins.read().await
    }

    pub async fn query_count(&self) -> u32 {
        *self.queries.read().await
    }

    async fn record(
        &self,
        kind: SubmissionKind,
        tag: &str,
        save_path: &str,
    ) -> Result<(), RemoteClientError> {
        self.login().await?;
        // Suspend here the way a real request would
        tokio::task::yield_now().await;

        if let Some(error) = self.next_submit_error.write().await.take() {
            return Err(error);
        }

        let name = match &kind {
            SubmissionKind::Magnet { .. } => format!("magnet for {}", tag),
            SubmissionKind::File { file_name, .. } => {
                file_name.trim_end_matches(".torrent").to_string()
            }
        };

        self.submissions.write().await.push(RecordedSubmission {
            kind,
            tag: tag.to_string(),
            save_path: save_path.to_string(),
        });

        if !*self.drop_submissions.read().await {
            self.statuses
                .write()
                .await
                .entry(tag.to_string())
                .or_default()
                .push(TorrentStatus::new(name, 0.0, 0));
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteClient for MockRemoteClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self) -> Result<(), RemoteClientError> {
        *self.logins.write().await += 1;
        Ok(())
    }

    async fn submit_magnet(
        &self,
        uri: &str,
        tag: &str,
        save_path: &str,
    ) -> Result<(), RemoteClientError> {
        self.record(
            SubmissionKind::Magnet {
                uri: uri.to_string(),
            },
            tag,
            save_path,
        )
        .await
    }

    async fn submit_file(
        &self,
        file_name: &str,
        content: Vec<u8>,
        tag: &str,
        save_path: &str,
    ) -> Result<(), RemoteClientError> {
        self.record(
            SubmissionKind::File {
                file_name: file_name.to_string(),
                size: content.len(),
            },
            tag,
            save_path,
        )
        .await
    }

    async fn query_by_tag(&self, tag: &str) -> Result<Vec<TorrentStatus>, RemoteClientError> {
        self.login().await?;
        *self.queries.write().await += 1;

        if self.failing_queries.read().await.contains(tag) {
            return Err(RemoteClientError::ConnectionFailed(format!(
                "mock network failure for {}",
                tag
            )));
        }

        Ok(self
            .statuses
            .read()
            .await
            .get(tag)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RejectReason;

    #[tokio::test]
    async fn test_submit_registers_entry() {
        let client = MockRemoteClient::new();
        client
            .submit_magnet("magnet:?xt=urn:btih:abc", "id-1234", "/dl")
            .await
            .unwrap();

        let statuses = client.query_by_tag("id-1234").await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(client.login_count().await, 2);
        assert_eq!(client.query_count().await, 1);
        assert_eq!(statuses[0].progress, 0.0);
        assert_eq!(client.submissions().await[0].save_path, "/dl");
    }

    #[tokio::test]
    async fn test_next_submit_error_is_consumed() {
        let client = MockRemoteClient::new();
        client
            .set_next_submit_error(RemoteClientError::SubmitRejected {
                status: 409,
                reason: RejectReason::classify("already exists"),
            })
            .await;

        let first = client.submit_file("a.torrent", vec![1], "id-1", "/dl").await;
        assert!(first.is_err());
        let second = client.submit_file("a.torrent", vec![1], "id-1", "/dl").await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_submission_registers_nothing() {
        let client = MockRemoteClient::new();
        client.drop_submissions(true).await;
        client
            .submit_magnet("magnet:?xt=urn:btih:abc", "id-1", "/dl")
            .await
            .unwrap();
        assert!(client.query_by_tag("id-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_queries() {
        let client = MockRemoteClient::new();
        client.fail_queries_for("id-1").await;
        assert!(client.query_by_tag("id-1").await.is_err());
        client.clear_query_failure("id-1").await;
        assert!(client.query_by_tag("id-1").await.unwrap().is_empty());
    }
}
