//! Job store with switchable failures.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::job::{Job, JobStore, JobStoreError, SqliteJobStore, SubscriberId};

/// In-memory store whose operations can be made to fail one kind at a time.
///
/// Backed by a real [`SqliteJobStore`], so whatever succeeds is persisted.
pub struct FailingJobStore {
    inner: SqliteJobStore,
    fail_add: AtomicBool,
    fail_list: AtomicBool,
    fail_remove: AtomicBool,
}

impl FailingJobStore {
    pub fn new() -> Result<Self, JobStoreError> {
        Ok(Self {
            inner: SqliteJobStore::in_memory()?,
            fail_add: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        })
    }

    pub fn fail_add(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), JobStoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(JobStoreError::Database(format!("mock {} failure", op)));
        }
        Ok(())
    }
}

impl JobStore for FailingJobStore {
    fn add(&self, tag: &str, subscriber: SubscriberId) -> Result<(), JobStoreError> {
        Self::check(&self.fail_add, "add")?;
        self.inner.add(tag, subscriber)
    }

    fn list_all(&self) -> Result<Vec<Job>, JobStoreError> {
        Self::check(&self.fail_list, "list")?;
        self.inner.list_all()
    }

    fn remove(&self, tag: &str) -> Result<bool, JobStoreError> {
        Self::check(&self.fail_remove, "remove")?;
        self.inner.remove(tag)
    }

    fn exists(&self, tag: &str) -> Result<bool, JobStoreError> {
        self.inner.exists(tag)
    }
}
