//! Bot API client. Implements the relay's [`Messenger`] port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use torrelay_core::{
    IncomingDocument, MessageOrigin, Messenger, MessengerError, SubscriberId, TelegramConfig,
};

use super::types::{ApiResponse, File, Update};

/// Extra time on top of the long-poll timeout before the HTTP request gives up.
const REQUEST_GRACE_SECS: u64 = 10;

pub struct TelegramApi {
    client: Client,
    /// `<api_url>/bot<token>`
    method_base: String,
    /// `<api_url>/file/bot<token>`
    file_base: String,
    poll_timeout_secs: u32,
}

impl TelegramApi {
    pub fn new(config: &TelegramConfig) -> Result<Self, MessengerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs as u64 + REQUEST_GRACE_SECS,
            ))
            .build()
            .map_err(|e| MessengerError::Request(format!("Failed to create HTTP client: {}", e)))?;

        let api_url = config.api_url.trim_end_matches('/');

        Ok(Self {
            client,
            method_base: format!("{}/bot{}", api_url, config.token),
            file_base: format!("{}/file/bot{}", api_url, config.token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.method_base, method)
    }

    /// Call a Bot API method and unwrap its envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
    ) -> Result<T, MessengerError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| MessengerError::Request(format!("{}: {}", method, e.without_url())))?;

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            MessengerError::Api(format!("{}: invalid response: {}", method, e.without_url()))
        })?;

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(MessengerError::Api(format!(
                "{}: {}",
                method,
                envelope
                    .description
                    .unwrap_or_else(|| "request failed".to_string())
            ))),
        }
    }

    /// Long-poll for message updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, MessengerError> {
        let mut body = json!({
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", &body).await
    }

    async fn send(
        &self,
        chat_id: SubscriberId,
        reply_to: Option<i64>,
        text: &str,
    ) -> Result<(), MessengerError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(message_id) = reply_to {
            body["reply_parameters"] = json!({
                "message_id": message_id,
                "allow_sending_without_reply": true,
            });
        }

        let _: Value = self.call("sendMessage", &body).await?;
        debug!("Sent message to chat {}", chat_id);
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramApi {
    async fn send_message(&self, chat_id: SubscriberId, text: &str) -> Result<(), MessengerError> {
        self.send(chat_id, None, text).await
    }

    async fn reply(&self, origin: &MessageOrigin, text: &str) -> Result<(), MessengerError> {
        self.send(origin.chat_id, Some(origin.message_id), text).await
    }

    async fn download_document(
        &self,
        document: &IncomingDocument,
    ) -> Result<Vec<u8>, MessengerError> {
        let file: File = self
            .call("getFile", &json!({ "file_id": document.file_id }))
            .await?;

        let path = file.file_path.ok_or_else(|| {
            MessengerError::Api(format!("getFile: no download path for {}", file.file_id))
        })?;

        let response = self
            .client
            .get(format!("{}/{}", self.file_base, path))
            .send()
            .await
            .map_err(|e| MessengerError::Request(format!("file download: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MessengerError::Api(format!(
                "file download: HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MessengerError::Request(format!("file download: {}", e.without_url())))?;

        debug!("Downloaded {} bytes for {}", bytes.len(), document.file_id);
        Ok(bytes.to_vec())
    }
}
