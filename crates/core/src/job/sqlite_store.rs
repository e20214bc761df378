//! SQLite-backed job store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::{Job, JobStore, JobStoreError, SubscriberId};

/// SQLite-backed job store.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Create a new SQLite job store, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, JobStoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite job store (useful for testing).
    pub fn in_memory() -> Result<Self, JobStoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), JobStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id_tag TEXT PRIMARY KEY,
                chat_id INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, JobStoreError> {
        self.conn
            .lock()
            .map_err(|_| JobStoreError::Database("connection mutex poisoned".to_string()))
    }
}

impl JobStore for SqliteJobStore {
    fn add(&self, tag: &str, subscriber: SubscriberId) -> Result<(), JobStoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO jobs (id_tag, chat_id) VALUES (?, ?)",
            params![tag, subscriber],
        )?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Job>, JobStoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id_tag, chat_id FROM jobs")?;

        let rows = stmt.query_map([], |row| {
            Ok(Job {
                tag: row.get(0)?,
                subscriber: row.get(1)?,
            })
        })?;

        let mut jobs = Vec::new();
        for row_result in rows {
            jobs.push(row_result?);
        }

        Ok(jobs)
    }

    fn remove(&self, tag: &str) -> Result<bool, JobStoreError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM jobs WHERE id_tag = ?", params![tag])?;
        Ok(deleted > 0)
    }

    fn exists(&self, tag: &str) -> Result<bool, JobStoreError> {
        let conn = self.conn()?;
        let found = conn
            .query_row("SELECT 1 FROM jobs WHERE id_tag = ?", params![tag], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteJobStore {
        SqliteJobStore::in_memory().unwrap()
    }

    #[test]
    fn test_add_and_list() {
        let store = create_test_store();
        store.add("id-1234", 42).unwrap();
        store.add("id-5678", 7).unwrap();

        let mut jobs = store.list_all().unwrap();
        jobs.sort_by(|a, b| a.tag.cmp(&b.tag));
        assert_eq!(jobs, vec![Job::new("id-1234", 42), Job::new("id-5678", 7)]);
    }

    #[test]
    fn test_add_existing_tag_replaces_subscriber() {
        let store = create_test_store();
        store.add("id-1234", 42).unwrap();
        store.add("id-1234", 99).unwrap();

        let jobs = store.list_all().unwrap();
        assert_eq!(jobs, vec![Job::new("id-1234", 99)]);
    }

    #[test]
    fn test_exists() {
        let store = create_test_store();
        assert!(!store.exists("id-1234").unwrap());
        store.add("id-1234", 42).unwrap();
        assert!(store.exists("id-1234").unwrap());
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let store = create_test_store();
        store.add("id-1234", 42).unwrap();

        assert!(store.remove("id-1234").unwrap());
        assert!(!store.remove("id-1234").unwrap());
        assert!(!store.exists("id-1234").unwrap());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_negative_subscriber_ids_round_trip() {
        // Group chats have negative ids
        let store = create_test_store();
        store.add("id-1000", -1001234567890).unwrap();
        assert_eq!(store.list_all().unwrap()[0].subscriber, -1001234567890);
    }

    #[test]
    fn test_file_based_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("jobs.db");

        {
            let store = SqliteJobStore::new(&db_path).unwrap();
            store.add("id-4242", 42).unwrap();
        }

        assert!(db_path.exists());

        let reopened = SqliteJobStore::new(&db_path).unwrap();
        assert!(reopened.exists("id-4242").unwrap());
        assert_eq!(reopened.list_all().unwrap(), vec![Job::new("id-4242", 42)]);
    }
}
