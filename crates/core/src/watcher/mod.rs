//! Background job watcher.
//!
//! Polls the engine for every stored job, throttles progress messages,
//! announces completions and forgets finished jobs. On start it logs which
//! stored jobs are still running.
//!
//! Throttle timestamps live in memory only, so the first progress message
//! after a restart goes out immediately.

mod report;
mod runner;
mod types;

pub use report::{finished_message, progress_message};
pub use runner::JobWatcher;
pub use types::{JobOutcome, TickSummary, UnfinishedJob};
