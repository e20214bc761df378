pub mod config;
pub mod context;
pub mod job;
pub mod messenger;
pub mod remote;
pub mod submission;
pub mod testing;
pub mod watcher;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, QBittorrentConfig,
    SanitizedConfig, TelegramConfig, WatcherConfig,
};
pub use context::{RelayContext, RelaySettings};
pub use job::{Job, JobStore, JobStoreError, SqliteJobStore, SubscriberId, TagGenerator};
pub use messenger::{escape_html, IncomingDocument, MessageOrigin, Messenger, MessengerError};
pub use remote::{QBittorrentClient, RejectReason, RemoteClient, RemoteClientError, TorrentStatus};
pub use submission::{AcceptedJob, SubmissionHandler, SubmitError};
pub use watcher::{JobWatcher, TickSummary};
