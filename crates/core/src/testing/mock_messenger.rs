//! Mock chat front-end for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::job::SubscriberId;
use crate::messenger::{IncomingDocument, MessageOrigin, Messenger, MessengerError};

/// A message the relay sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: SubscriberId,
    /// Set when the message answered an inbound one.
    pub reply_to: Option<i64>,
    pub text: String,
}

/// Mock implementation of the Messenger trait.
///
/// Records every outbound message and serves document bytes registered with
/// [`MockMessenger::add_document`].
#[derive(Debug, Default)]
pub struct MockMessenger {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    documents: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    fail_sends: Arc<RwLock<bool>>,
}

impl MockMessenger {
    /// Create a new mock messenger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, replies included.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// Texts sent to one chat.
    pub async fn sent_to(&self, chat_id: SubscriberId) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Forget recorded messages.
    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }

    /// Make `file_id` downloadable.
    pub async fn add_document(&self, file_id: &str, content: Vec<u8>) {
        self.documents
            .write()
            .await
            .insert(file_id.to_string(), content);
    }

    /// Make every send fail (after recording the attempt).
    pub async fn fail_sends(&self, fail: bool) {
        *self.fail_sends.write().await = fail;
    }

    async fn push(
        &self,
        chat_id: SubscriberId,
        reply_to: Option<i64>,
        text: &str,
    ) -> Result<(), MessengerError> {
        self.sent.write().await.push(SentMessage {
            chat_id,
            reply_to,
            text: text.to_string(),
        });

        if *self.fail_sends.read().await {
            return Err(MessengerError::Request("mock send failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, chat_id: SubscriberId, text: &str) -> Result<(), MessengerError> {
        self.push(chat_id, None, text).await
    }

    async fn reply(&self, origin: &MessageOrigin, text: &str) -> Result<(), MessengerError> {
        self.push(origin.chat_id, Some(origin.message_id), text).await
    }

    async fn download_document(
        &self,
        document: &IncomingDocument,
    ) -> Result<Vec<u8>, MessengerError> {
        self.documents
            .read()
            .await
            .get(&document.file_id)
            .cloned()
            .ok_or_else(|| MessengerError::Api(format!("file not found: {}", document.file_id)))
    }
}
