//! Chat front-end port.
//!
//! The relay never talks to a chat service directly. The binary plugs in an
//! adapter implementing [`Messenger`]; tests use
//! [`MockMessenger`](crate::testing::MockMessenger).

use async_trait::async_trait;
use thiserror::Error;

use crate::job::SubscriberId;

/// Errors from the chat front-end.
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Front-end API error: {0}")]
    Api(String),
}

/// Where an inbound message came from, so we can answer it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOrigin {
    pub chat_id: SubscriberId,
    pub message_id: i64,
}

/// A file sent to the bot. The content is fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingDocument {
    /// Front-end handle used to download the content.
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

/// Outbound side of the chat front-end.
///
/// Texts are HTML-formatted; callers escape dynamic parts with [`escape_html`].
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a message to a chat.
    async fn send_message(&self, chat_id: SubscriberId, text: &str) -> Result<(), MessengerError>;

    /// Answer an inbound message.
    async fn reply(&self, origin: &MessageOrigin, text: &str) -> Result<(), MessengerError>;

    /// Fetch the bytes of an inbound document.
    async fn download_document(
        &self,
        document: &IncomingDocument,
    ) -> Result<Vec<u8>, MessengerError>;
}

/// Escape text for HTML-formatted messages.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
