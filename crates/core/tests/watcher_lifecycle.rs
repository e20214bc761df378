//! Watcher lifecycle integration tests.
//!
//! Jobs are submitted through the real handler, then driven to completion by
//! changing what the mock engine reports.

use std::sync::Arc;
use std::time::{Duration, Instant};

use torrelay_core::{
    testing::{FailingJobStore, MockMessenger, MockRemoteClient},
    JobStore, JobWatcher, MessageOrigin, Messenger, RelayContext, RelaySettings, RemoteClient,
    SqliteJobStore, SubmissionHandler, TorrentStatus, WatcherConfig,
};

const ALICE: i64 = 100;
const BOB: i64 = 200;

struct TestHarness {
    context: Arc<RelayContext>,
    handler: SubmissionHandler,
    store: Arc<dyn JobStore>,
    remote: Arc<MockRemoteClient>,
    messenger: Arc<MockMessenger>,
}

impl TestHarness {
    fn new() -> Self {
        let store = Arc::new(SqliteJobStore::in_memory().expect("Failed to create store"));
        Self::with_store(store)
    }

    fn with_store(store: Arc<dyn JobStore>) -> Self {
        let remote = Arc::new(MockRemoteClient::new());
        let messenger = Arc::new(MockMessenger::new());

        let context = Arc::new(RelayContext::new(
            Arc::clone(&remote) as Arc<dyn RemoteClient>,
            Arc::clone(&store),
            Arc::clone(&messenger) as Arc<dyn Messenger>,
            RelaySettings {
                save_path: "/downloads".to_string(),
                allowed_chat_id: None,
            },
        ));

        Self {
            handler: SubmissionHandler::new(Arc::clone(&context)),
            context,
            store,
            remote,
            messenger,
        }
    }

    fn watcher(&self, config: WatcherConfig) -> JobWatcher {
        JobWatcher::new(Arc::clone(&self.context), config)
    }

    /// Submit a magnet for `chat_id` and return the stored tag.
    async fn submit(&self, chat_id: i64, hash: &str) -> String {
        let origin = MessageOrigin {
            chat_id,
            message_id: 1,
        };
        self.handler
            .submit_magnet(&origin, &format!("magnet:?xt=urn:btih:{}", hash))
            .await
            .expect("submission should be accepted")
            .tag
    }
}

#[tokio::test]
async fn test_finished_job_notifies_once_and_is_removed() {
    let h = TestHarness::new();
    let tag = h.submit(ALICE, "aaa").await;
    h.remote
        .set_statuses(
            &tag,
            vec![
                TorrentStatus::new("Disc 1", 1.0, 0),
                TorrentStatus::new("Disc 2", 0.5, 1024),
            ],
        )
        .await;

    let watcher = h.watcher(WatcherConfig::default());
    let summary = watcher.tick().await;
    assert_eq!(summary.finished, 1);

    let sent = h.messenger.sent_to(ALICE).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("🟢 Finished ID "));
    assert!(sent[0].contains("Disc 1"));
    assert!(!sent[0].contains("Disc 2"));
    assert!(!h.store.exists(&tag).unwrap());

    // The job is gone, so later ticks do not query its tag at all
    let queries = h.remote.query_count().await;
    let summary = watcher.tick().await;
    assert_eq!(summary.checked, 0);
    assert_eq!(h.remote.query_count().await, queries);
    assert_eq!(h.messenger.sent_to(ALICE).await.len(), 1);
}

#[tokio::test]
async fn test_query_failure_for_one_job_does_not_block_others() {
    let h = TestHarness::new();
    let broken = h.submit(ALICE, "aaa").await;
    let healthy = h.submit(BOB, "bbb").await;

    h.remote.fail_queries_for(&broken).await;
    h.remote.set_progress(&healthy, 1.0).await;

    let watcher = h.watcher(WatcherConfig::default());
    let summary = watcher.tick().await;
    assert_eq!(summary.checked, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.finished, 1);

    assert!(h.store.exists(&broken).unwrap());
    assert!(!h.store.exists(&healthy).unwrap());
    assert!(h.messenger.sent_to(ALICE).await.is_empty());
    assert_eq!(h.messenger.sent_to(BOB).await.len(), 1);

    // Recovers on a later tick
    h.remote.clear_query_failure(&broken).await;
    h.remote.set_progress(&broken, 1.0).await;
    let summary = watcher.tick().await;
    assert_eq!(summary.finished, 1);
    assert!(h.store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_respects_window() {
    let h = TestHarness::new();
    let tag = h.submit(ALICE, "aaa").await;
    h.remote
        .set_statuses(&tag, vec![TorrentStatus::new("Ubuntu", 0.2, 512)])
        .await;

    let watcher = h.watcher(WatcherConfig {
        progress_interval_secs: 60,
        ..WatcherConfig::default()
    });

    let start = Instant::now();
    watcher.tick_at(start).await;
    h.remote.set_progress(&tag, 0.4).await;
    watcher.tick_at(start + Duration::from_secs(30)).await;
    watcher.tick_at(start + Duration::from_secs(61)).await;

    let sent = h.messenger.sent_to(ALICE).await;
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("20.0%"));
    assert!(sent[1].starts_with("🔁 Progress ID "));
    assert!(sent[1].contains("Ubuntu: 40.0% (512 B/s)"));
    assert!(h.store.exists(&tag).unwrap());
}

#[tokio::test]
async fn test_reconcile_is_read_only() {
    let h = TestHarness::new();
    let running = h.submit(ALICE, "aaa").await;
    let done = h.submit(BOB, "bbb").await;
    h.remote.set_progress(&done, 1.0).await;

    let watcher = h.watcher(WatcherConfig::default());
    let unfinished = watcher.reconcile().await;

    assert_eq!(unfinished.len(), 1);
    assert_eq!(unfinished[0].tag, running);
    assert_eq!(unfinished[0].names, vec![format!("magnet for {}", running)]);

    assert!(h.messenger.sent().await.is_empty());
    assert_eq!(h.store.list_all().unwrap().len(), 2);
}

#[tokio::test]
async fn test_restart_resumes_jobs_and_resets_throttle() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("jobs.db");

    let tag = {
        let h = TestHarness::with_store(Arc::new(SqliteJobStore::new(&db_path).unwrap()));
        let tag = h.submit(ALICE, "aaa").await;
        let watcher = h.watcher(WatcherConfig::default());
        watcher.tick().await;
        assert_eq!(h.messenger.sent_to(ALICE).await.len(), 1);
        tag
    };

    // A new process: same database, fresh engine view and throttle state
    let h = TestHarness::with_store(Arc::new(SqliteJobStore::new(&db_path).unwrap()));
    h.remote
        .set_statuses(&tag, vec![TorrentStatus::new("Ubuntu", 0.7, 0)])
        .await;

    let watcher = h.watcher(WatcherConfig::default());
    let summary = watcher.tick().await;
    assert_eq!(summary.progress_sent, 1);
    assert!(h.messenger.sent_to(ALICE).await[0].contains("70.0%"));
}

#[tokio::test]
async fn test_send_failure_still_completes_job() {
    let h = TestHarness::new();
    let tag = h.submit(ALICE, "aaa").await;
    h.remote.set_progress(&tag, 1.0).await;
    h.messenger.fail_sends(true).await;

    let watcher = h.watcher(WatcherConfig::default());
    let summary = watcher.tick().await;

    assert_eq!(summary.finished, 1);
    assert!(!h.store.exists(&tag).unwrap());
}

#[tokio::test]
async fn test_background_loop_start_and_stop() {
    let h = TestHarness::new();
    let tag = h.submit(ALICE, "aaa").await;
    h.remote.set_progress(&tag, 1.0).await;

    let watcher = Arc::new(h.watcher(WatcherConfig {
        poll_interval_secs: 1,
        progress_interval_secs: 60,
        startup_delay_secs: 0,
    }));

    watcher.start().await;
    assert!(watcher.is_running());

    let mut removed = false;
    for _ in 0..50 {
        if !h.store.exists(&tag).unwrap() {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(removed);
    assert_eq!(h.messenger.sent_to(ALICE).await.len(), 1);

    watcher.stop();
    assert!(!watcher.is_running());
}

#[tokio::test]
async fn test_store_listing_failure_skips_the_pass() {
    let store = Arc::new(FailingJobStore::new().unwrap());
    let h = TestHarness::with_store(store.clone());
    let tag = h.submit(ALICE, "aaa").await;
    h.remote.set_progress(&tag, 1.0).await;

    store.fail_list(true);
    let watcher = h.watcher(WatcherConfig::default());
    assert!(watcher.reconcile().await.is_empty());
    let summary = watcher.tick().await;
    assert_eq!(summary.checked, 0);
    assert!(h.messenger.sent().await.is_empty());

    // Next pass after the store recovers handles the job normally
    store.fail_list(false);
    let summary = watcher.tick().await;
    assert_eq!(summary.finished, 1);
    assert!(!store.exists(&tag).unwrap());
}

#[tokio::test]
async fn test_failed_removal_is_retried_next_tick() {
    let store = Arc::new(FailingJobStore::new().unwrap());
    let h = TestHarness::with_store(store.clone());
    let tag = h.submit(ALICE, "aaa").await;
    h.remote.set_progress(&tag, 1.0).await;

    store.fail_remove(true);
    let watcher = h.watcher(WatcherConfig::default());
    let summary = watcher.tick().await;
    assert_eq!(summary.finished, 1);
    assert!(store.exists(&tag).unwrap());
    assert_eq!(h.messenger.sent_to(ALICE).await.len(), 1);

    h.messenger.clear().await;
    store.fail_remove(false);
    let summary = watcher.tick().await;
    assert_eq!(summary.finished, 1);
    assert!(!store.exists(&tag).unwrap());

    let sent = h.messenger.sent_to(ALICE).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("🟢 Finished ID "));

    let summary = watcher.tick().await;
    assert_eq!(summary.checked, 0);
}
