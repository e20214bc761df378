//! Job watcher implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::WatcherConfig;
use crate::context::RelayContext;
use crate::job::Job;
use crate::remote::TorrentStatus;

use super::report::{finished_message, progress_message};
use super::types::{JobOutcome, TickSummary, UnfinishedJob};

/// How many names per job the startup log shows.
const RECONCILE_LOG_NAMES: usize = 5;

/// Polls every stored job and notifies its subscriber.
pub struct JobWatcher {
    context: Arc<RelayContext>,
    config: WatcherConfig,
    /// Last progress notification per tag. Memory only.
    last_progress: Mutex<HashMap<String, Instant>>,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobWatcher {
    pub fn new(context: Arc<RelayContext>, config: WatcherConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            context,
            config,
            last_progress: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.config.progress_interval_secs)
    }

    /// Reconcile, then spawn the polling loop.
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Job watcher already running");
            return;
        }

        self.reconcile().await;

        let watcher = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let startup_delay = Duration::from_secs(self.config.startup_delay_secs);

        tokio::spawn(async move {
            info!("Job watcher loop started");

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Job watcher loop stopped before first poll");
                    return;
                }
                _ = tokio::time::sleep(startup_delay) => {}
            }

            loop {
                if !watcher.running.load(Ordering::Relaxed) {
                    break;
                }

                let summary = watcher.tick().await;
                debug!(
                    "Watcher tick: {} checked, {} finished, {} progress, {} throttled, {} no news, {} failed",
                    summary.checked,
                    summary.finished,
                    summary.progress_sent,
                    summary.throttled,
                    summary.no_news,
                    summary.failed
                );

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Job watcher received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(watcher.poll_interval()) => {}
                }
            }

            info!("Job watcher loop stopped");
        });
    }

    /// Signal the polling loop to exit.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Job watcher not running");
            return;
        }
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Log stored jobs that still have unfinished entries.
    ///
    /// Read-only: never notifies, never touches the store.
    pub async fn reconcile(&self) -> Vec<UnfinishedJob> {
        let jobs = match self.context.store.list_all() {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Watcher startup check failed: {}", e);
                return Vec::new();
            }
        };

        let mut unfinished = Vec::new();
        for job in jobs {
            let statuses = match self.context.remote.query_by_tag(&job.tag).await {
                Ok(statuses) => statuses,
                Err(e) => {
                    warn!("Startup: failed to query tag {}: {}", job.tag, e);
                    continue;
                }
            };

            let names: Vec<String> = statuses
                .into_iter()
                .filter(|s| !s.is_finished())
                .map(|s| s.name)
                .collect();

            if !names.is_empty() {
                unfinished.push(UnfinishedJob {
                    tag: job.tag,
                    names,
                });
            }
        }

        if unfinished.is_empty() {
            info!("Watcher starting: no unfinished jobs");
        } else {
            info!("Watcher starting: {} unfinished job(s)", unfinished.len());
            for job in &unfinished {
                let shown: Vec<&str> = job
                    .names
                    .iter()
                    .take(RECONCILE_LOG_NAMES)
                    .map(String::as_str)
                    .collect();
                info!(
                    "  {}: {} torrents: {}",
                    job.tag,
                    job.names.len(),
                    shown.join(", ")
                );
            }
        }

        unfinished
    }

    /// One pass over every stored job.
    pub async fn tick(&self) -> TickSummary {
        self.tick_at(Instant::now()).await
    }

    /// One pass over every stored job, with `now` as the throttle clock.
    pub async fn tick_at(&self, now: Instant) -> TickSummary {
        let mut summary = TickSummary::default();

        let jobs = match self.context.store.list_all() {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Watcher loop error: {}", e);
                return summary;
            }
        };

        for job in &jobs {
            let outcome = self.check_job(job, now).await;
            summary.record(outcome);
        }

        summary
    }

    async fn check_job(&self, job: &Job, now: Instant) -> JobOutcome {
        let statuses = match self.context.remote.query_by_tag(&job.tag).await {
            Ok(statuses) => statuses,
            Err(e) => {
                warn!("Watcher error for {}: {}", job.tag, e);
                return JobOutcome::QueryFailed;
            }
        };

        let finished: Vec<&TorrentStatus> = statuses.iter().filter(|s| s.is_finished()).collect();
        if !finished.is_empty() {
            self.complete(job, &finished).await;
            return JobOutcome::Finished;
        }

        if statuses.is_empty() {
            return JobOutcome::NoNews;
        }

        if !self.progress_due(&job.tag, now) {
            return JobOutcome::Throttled;
        }

        let text = progress_message(&job.tag, &statuses);
        if let Err(e) = self.context.messenger.send_message(job.subscriber, &text).await {
            error!("Failed to send progress message for {}: {}", job.tag, e);
        }
        self.mark_progress(&job.tag, now);

        JobOutcome::ProgressSent
    }

    /// Notify, then drop the job and its throttle entry.
    async fn complete(&self, job: &Job, finished: &[&TorrentStatus]) {
        let text = finished_message(&job.tag, finished);
        if let Err(e) = self.context.messenger.send_message(job.subscriber, &text).await {
            error!("Failed to send finished message for {}: {}", job.tag, e);
        }

        match self.context.store.remove(&job.tag) {
            Ok(_) => info!("Job {} finished", job.tag),
            Err(e) => warn!("Failed to remove finished job {}: {}", job.tag, e),
        }

        if let Ok(mut last) = self.last_progress.lock() {
            last.remove(&job.tag);
        }
    }

    fn progress_due(&self, tag: &str, now: Instant) -> bool {
        let Ok(last) = self.last_progress.lock() else {
            return true;
        };
        match last.get(tag) {
            Some(sent_at) => now.saturating_duration_since(*sent_at) >= self.progress_interval(),
            None => true,
        }
    }

    fn mark_progress(&self, tag: &str, now: Instant) {
        if let Ok(mut last) = self.last_progress.lock() {
            last.insert(tag.to_string(), now);
        }
    }
}
