//! Job registry: which chat is waiting on which tagged download.

mod sqlite_store;
mod store;
mod tag;

pub use sqlite_store::SqliteJobStore;
pub use store::{Job, JobStore, JobStoreError, SubscriberId};
pub use tag::{display_label, format_tag, TagGenerator, TagReservation, TAG_PREFIX};
