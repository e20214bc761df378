//! Types for the job watcher.

/// What one poll of one job led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// At least one entry finished; subscriber notified, job removed.
    Finished,
    /// Still running; a progress message went out.
    ProgressSent,
    /// Still running; last progress message is too recent.
    Throttled,
    /// The engine returned nothing for the tag.
    NoNews,
    /// The status query failed; the job is retried next tick.
    QueryFailed,
}

/// Counts for one pass over all jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub checked: usize,
    pub finished: usize,
    pub progress_sent: usize,
    pub throttled: usize,
    pub no_news: usize,
    pub failed: usize,
}

impl TickSummary {
    pub(crate) fn record(&mut self, outcome: JobOutcome) {
        self.checked += 1;
        match outcome {
            JobOutcome::Finished => self.finished += 1,
            JobOutcome::ProgressSent => self.progress_sent += 1,
            JobOutcome::Throttled => self.throttled += 1,
            JobOutcome::NoNews => self.no_news += 1,
            JobOutcome::QueryFailed => self.failed += 1,
        }
    }
}

/// A stored job that still has unfinished engine entries at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfinishedJob {
    pub tag: String,
    pub names: Vec<String>,
}
