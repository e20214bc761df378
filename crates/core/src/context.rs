//! Shared collaborators, built once at startup.

use std::sync::Arc;

use crate::config::Config;
use crate::job::{JobStore, SubscriberId, TagGenerator};
use crate::messenger::Messenger;
use crate::remote::RemoteClient;

/// Relay-wide settings the handlers need at runtime.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Where the engine saves new downloads.
    pub save_path: String,
    /// Only this chat may submit. `None` accepts everyone.
    pub allowed_chat_id: Option<SubscriberId>,
}

impl RelaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            save_path: config.downloads.save_path.clone(),
            allowed_chat_id: config.telegram.allowed_chat_id,
        }
    }

    /// Whether `chat_id` may submit downloads.
    pub fn is_allowed(&self, chat_id: SubscriberId) -> bool {
        self.allowed_chat_id
            .map(|allowed| allowed == chat_id)
            .unwrap_or(true)
    }
}

/// Everything the submission handler and the watcher share.
///
/// Passed around as `Arc<RelayContext>`; there are no process globals.
pub struct RelayContext {
    pub remote: Arc<dyn RemoteClient>,
    pub store: Arc<dyn JobStore>,
    pub messenger: Arc<dyn Messenger>,
    pub tags: TagGenerator,
    pub settings: RelaySettings,
}

impl RelayContext {
    pub fn new(
        remote: Arc<dyn RemoteClient>,
        store: Arc<dyn JobStore>,
        messenger: Arc<dyn Messenger>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            tags: TagGenerator::new(Arc::clone(&store)),
            remote,
            store,
            messenger,
            settings,
        }
    }
}
