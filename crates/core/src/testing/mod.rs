//! Testing utilities and mock implementations.
//!
//! Mock versions of the engine client and the chat front-end, plus a job
//! store with switchable failures, so submission and watcher flows can be
//! exercised without a real qBittorrent or chat service.
//!
//! # Example
//!
//! ```rust,ignore
//! use torrelay_core::testing::{MockMessenger, MockRemoteClient};
//!
//! let remote = MockRemoteClient::new();
//! let messenger = MockMessenger::new();
//!
//! // Pretend the engine is 40% through the job
//! remote.set_statuses("id-1234", vec![TorrentStatus::new("Ubuntu", 0.4, 0)]).await;
//! ```

mod failing_job_store;
mod mock_messenger;
mod mock_remote_client;

pub use failing_job_store::FailingJobStore;
pub use mock_messenger::{MockMessenger, SentMessage};
pub use mock_remote_client::{MockRemoteClient, RecordedSubmission, SubmissionKind};
