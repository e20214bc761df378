//! Long-polling update loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use torrelay_core::{IncomingDocument, MessageOrigin, SubmissionHandler};

use super::api::TelegramApi;
use super::types::Message;

/// Pause after a failed `getUpdates` before asking again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// What an inbound message asks the relay to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start(MessageOrigin),
    Document(MessageOrigin, IncomingDocument),
    Text(MessageOrigin, String),
}

/// Classify a message. Messages with neither text nor a document are dropped.
pub fn route(message: &Message) -> Option<Inbound> {
    let origin = MessageOrigin {
        chat_id: message.chat.id,
        message_id: message.message_id,
    };

    if let Some(document) = &message.document {
        return Some(Inbound::Document(
            origin,
            IncomingDocument {
                file_id: document.file_id.clone(),
                file_name: document.file_name.clone(),
                mime_type: document.mime_type.clone(),
            },
        ));
    }

    let text = message.text.as_deref()?;
    if is_start_command(text) {
        return Some(Inbound::Start(origin));
    }
    Some(Inbound::Text(origin, text.to_string()))
}

/// `/start`, optionally addressed as `/start@SomeBot`.
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}

pub struct Poller {
    api: Arc<TelegramApi>,
    handler: Arc<SubmissionHandler>,
}

impl Poller {
    pub fn new(api: Arc<TelegramApi>, handler: Arc<SubmissionHandler>) -> Self {
        Self { api, handler }
    }

    /// Poll until `shutdown` resolves. Each update is handled on its own task.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;

        info!("Polling for chat updates");

        loop {
            let updates = tokio::select! {
                _ = &mut shutdown => break,
                result = self.api.get_updates(offset) => result,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("Failed to fetch updates: {}", e);
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => continue,
                    }
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);

                let Some(inbound) = update.message.as_ref().and_then(route) else {
                    debug!("Skipping update {}", update.update_id);
                    continue;
                };

                let handler = Arc::clone(&self.handler);
                tokio::spawn(async move { dispatch(&handler, inbound).await });
            }
        }

        info!("Update polling stopped");
    }
}

async fn dispatch(handler: &SubmissionHandler, inbound: Inbound) {
    match inbound {
        Inbound::Start(origin) => handler.handle_start(&origin).await,
        Inbound::Document(origin, document) => handler.handle_document(&origin, &document).await,
        Inbound::Text(origin, text) => handler.handle_text(&origin, &text).await,
    }
}
