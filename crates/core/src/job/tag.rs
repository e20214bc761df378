//! Short, human-readable job tags.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use rand::Rng;

use super::{JobStore, JobStoreError};

/// Prefix shared by every job tag.
pub const TAG_PREFIX: &str = "id-";

/// Four-digit ids, 9000 distinct values.
const SHORT_ID_RANGE: RangeInclusive<u16> = 1000..=9999;

/// Build the stored/engine tag for a short id.
pub fn format_tag(short_id: &str) -> String {
    format!("{}{}", TAG_PREFIX, short_id)
}

/// Human label for a tag, e.g. `id-1234` -> `ID 1234`.
pub fn display_label(tag: &str) -> String {
    match tag.strip_prefix(TAG_PREFIX) {
        Some(short_id) => format!("ID {}", short_id),
        None => tag.to_string(),
    }
}

type ReservedTags = Arc<Mutex<HashSet<String>>>;

/// Draws tags that are neither stored nor held by an in-flight submission.
///
/// The store check alone is racy: two submissions could both see a tag as
/// free before either persists it. Reservations close that window within this
/// process.
pub struct TagGenerator {
    store: Arc<dyn JobStore>,
    reserved: ReservedTags,
}

impl TagGenerator {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            reserved: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Draw a free tag and hold it until the returned reservation is dropped.
    ///
    /// Retries until a free value comes up. With a handful of live jobs out of
    /// 9000 ids that is almost always the first draw.
    pub fn next_tag(&self) -> Result<TagReservation, JobStoreError> {
        let mut rng = rand::rng();
        loop {
            let short_id = rng.random_range(SHORT_ID_RANGE).to_string();
            let tag = format_tag(&short_id);

            if self.store.exists(&tag)? {
                continue;
            }

            let mut reserved = self.reserved.lock().map_err(|_| {
                JobStoreError::Database("tag reservation mutex poisoned".to_string())
            })?;
            if reserved.insert(tag.clone()) {
                return Ok(TagReservation {
                    short_id,
                    tag,
                    reserved: Arc::clone(&self.reserved),
                });
            }
        }
    }

    /// Number of tags currently held by in-flight submissions.
    pub fn reserved_count(&self) -> usize {
        self.reserved.lock().map(|set| set.len()).unwrap_or(0)
    }
}

/// A tag held for one submission. Released on drop.
#[derive(Debug)]
pub struct TagReservation {
    short_id: String,
    tag: String,
    reserved: ReservedTags,
}

impl TagReservation {
    /// The bare digits, for display.
    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    /// The full tag, for storage and engine tagging.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Drop for TagReservation {
    fn drop(&mut self) {
        if let Ok(mut reserved) = self.reserved.lock() {
            reserved.remove(&self.tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SqliteJobStore;

    fn store() -> Arc<SqliteJobStore> {
        Arc::new(SqliteJobStore::in_memory().unwrap())
    }

    /// Fill the store with every tag except the given short ids.
    fn fill_except(store: &SqliteJobStore, free: &[u16]) {
        for id in SHORT_ID_RANGE {
            if !free.contains(&id) {
                store.add(&format_tag(&id.to_string()), 1).unwrap();
            }
        }
    }

    #[test]
    fn test_tag_format() {
        let generator = TagGenerator::new(store());
        let reservation = generator.next_tag().unwrap();

        assert_eq!(reservation.short_id().len(), 4);
        assert!(reservation.short_id().chars().all(|c| c.is_ascii_digit()));
        assert_eq!(reservation.tag(), format!("id-{}", reservation.short_id()));
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("id-1234"), "ID 1234");
        assert_eq!(display_label("custom"), "custom");
    }

    #[test]
    fn test_skips_stored_tags() {
        let store = store();
        fill_except(&store, &[4321]);

        let generator = TagGenerator::new(store.clone());
        let reservation = generator.next_tag().unwrap();
        assert_eq!(reservation.tag(), "id-4321");
        assert!(!store.exists(reservation.tag()).unwrap());
    }

    #[test]
    fn test_skips_reserved_tags_until_released() {
        let store = store();
        fill_except(&store, &[1111, 2222]);

        let generator = TagGenerator::new(store);
        let first = generator.next_tag().unwrap();
        let second = generator.next_tag().unwrap();
        assert_ne!(first.tag(), second.tag());
        assert_eq!(generator.reserved_count(), 2);

        let released = first.tag().to_string();
        drop(first);
        assert_eq!(generator.reserved_count(), 1);

        let third = generator.next_tag().unwrap();
        assert_eq!(third.tag(), released);
    }
}
