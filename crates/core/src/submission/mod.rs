//! Turning chat messages into engine jobs.
//!
//! A submission moves through
//! `received -> submitted -> verified -> persisted -> acknowledged`,
//! and may drop out as rejected at any step.

mod handler;
mod types;

pub use handler::{extract_magnet, is_torrent_file_name, SubmissionHandler};
pub use types::{AcceptedJob, SubmitError};
