//! Types for the submission flow.

use thiserror::Error;

use crate::job::JobStoreError;
use crate::messenger::MessengerError;
use crate::remote::RemoteClientError;

/// Why a submission did not become a job.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The engine refused the add or could not be reached.
    #[error("{0}")]
    Remote(#[from] RemoteClientError),

    /// The engine accepted the add, but nothing carries the tag afterwards.
    #[error("engine reported success but nothing is tagged {tag}")]
    VerificationMismatch { tag: String },

    /// The job could not be stored.
    #[error("failed to store job: {0}")]
    Persistence(#[from] JobStoreError),

    /// The document could not be fetched from the chat front-end.
    #[error("failed to fetch document: {0}")]
    Frontend(#[from] MessengerError),
}

/// A submission that was verified and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedJob {
    /// Four digits shown to the user.
    pub short_id: String,
    /// Stored tag.
    pub tag: String,
    /// Where the engine saves it.
    pub save_path: String,
}
