//! Job storage trait and types.

use std::fmt;

/// Opaque id of the chat that receives a job's notifications.
pub type SubscriberId = i64;

/// A persisted in-flight download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Unique tag, also attached to the engine's entries.
    pub tag: String,
    /// Who gets progress and completion messages.
    pub subscriber: SubscriberId,
}

impl Job {
    pub fn new(tag: impl Into<String>, subscriber: SubscriberId) -> Self {
        Self {
            tag: tag.into(),
            subscriber,
        }
    }
}

/// Error type for job storage operations.
#[derive(Debug)]
pub enum JobStoreError {
    /// Database error.
    Database(String),
}

impl fmt::Display for JobStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStoreError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for JobStoreError {}

impl From<rusqlite::Error> for JobStoreError {
    fn from(e: rusqlite::Error) -> Self {
        JobStoreError::Database(e.to_string())
    }
}

/// Trait for job storage backends.
///
/// Every operation is durable once it returns. Operations are atomic on
/// their own; nothing spans a check-then-act sequence.
pub trait JobStore: Send + Sync {
    /// Insert a job, replacing the subscriber if the tag already exists.
    fn add(&self, tag: &str, subscriber: SubscriberId) -> Result<(), JobStoreError>;

    /// All stored jobs, in no particular order.
    fn list_all(&self) -> Result<Vec<Job>, JobStoreError>;

    /// Delete a job. Returns whether a row was removed; absent tags are not an error.
    fn remove(&self, tag: &str) -> Result<bool, JobStoreError>;

    /// Whether a job with this tag is stored.
    fn exists(&self, tag: &str) -> Result<bool, JobStoreError>;
}
