//! Submission handler: validate, tag, submit, verify, persist, acknowledge.

use std::sync::Arc;

use regex_lite::Regex;
use tracing::{debug, error, info, warn};

use crate::context::RelayContext;
use crate::job::TagReservation;
use crate::messenger::{escape_html, IncomingDocument, MessageOrigin};

use super::{AcceptedJob, SubmitError};

/// Case-insensitive magnet pattern; the first match in a message wins.
const MAGNET_PATTERN: &str = r"(?i)magnet:\?xt=urn:[^\s]+";

const TORRENT_EXTENSION: &str = ".torrent";

/// Find the first magnet URI in free text.
pub fn extract_magnet(text: &str) -> Option<&str> {
    let re = Regex::new(MAGNET_PATTERN).ok()?;
    re.find(text).map(|m| m.as_str())
}

/// Whether a document name looks like a .torrent file.
pub fn is_torrent_file_name(name: &str) -> bool {
    name.to_lowercase().ends_with(TORRENT_EXTENSION)
}

/// Handles inbound chat messages that may carry a download.
pub struct SubmissionHandler {
    context: Arc<RelayContext>,
}

impl SubmissionHandler {
    pub fn new(context: Arc<RelayContext>) -> Self {
        Self { context }
    }

    /// `/start`: say hello and tell the user where things go.
    pub async fn handle_start(&self, origin: &MessageOrigin) {
        let text = format!(
            "✅ Bot is running.\nYour chat id: <code>{}</code>\n\nSaving to: <code>{}</code>\nSend a .torrent file (as file) or a magnet link.",
            origin.chat_id,
            escape_html(&self.context.settings.save_path)
        );
        self.reply(origin, &text).await;
    }

    /// Plain text: submit the first magnet link found, if any.
    ///
    /// Unauthorized chats and texts without a magnet are ignored silently.
    pub async fn handle_text(&self, origin: &MessageOrigin, text: &str) {
        if !self.context.settings.is_allowed(origin.chat_id) {
            debug!("Ignoring text from unauthorized chat {}", origin.chat_id);
            return;
        }

        let Some(magnet) = extract_magnet(text.trim()) else {
            return;
        };

        match self.submit_magnet(origin, magnet).await {
            Ok(job) => {
                let preview: String = magnet.chars().take(40).collect();
                info!("Added magnet {} with tag {}", preview, job.tag);
                self.reply(origin, &accepted_message("magnet", &job)).await;
            }
            Err(SubmitError::VerificationMismatch { tag }) => {
                warn!("Magnet add reported OK but no torrent found for tag {}", tag);
                self.reply(origin, &not_registered_message("Magnet")).await;
            }
            Err(e) => {
                error!("Failed to add magnet: {}", e);
                self.reply(origin, &failure_message("magnet", &e)).await;
            }
        }
    }

    /// Document: upload it if it is a .torrent file.
    ///
    /// Unlike text, rejected documents get a warning reply.
    pub async fn handle_document(&self, origin: &MessageOrigin, document: &IncomingDocument) {
        if !self.context.settings.is_allowed(origin.chat_id) {
            info!(
                "Unauthorized chat {} attempted to send a document",
                origin.chat_id
            );
            self.reply(origin, "⚠️ You are not authorized to use this bot.")
                .await;
            return;
        }

        let file_name = document.file_name.clone().unwrap_or_default();
        if !is_torrent_file_name(&file_name) {
            info!(
                "Ignored document (not .torrent): {} ({:?})",
                file_name, document.mime_type
            );
            self.reply(
                origin,
                "⚠️ Please send a .torrent file as a Document (not as a photo).",
            )
            .await;
            return;
        }

        self.reply(origin, "🔁 Received .torrent; uploading to qBittorrent...")
            .await;

        let result = match self.context.messenger.download_document(document).await {
            Ok(content) => self.submit_torrent_file(origin, &file_name, content).await,
            Err(e) => Err(SubmitError::from(e)),
        };

        match result {
            Ok(job) => {
                info!("Added torrent {} with tag {}", file_name, job.tag);
                self.reply(origin, &accepted_message(".torrent", &job)).await;
            }
            Err(SubmitError::VerificationMismatch { tag }) => {
                warn!("Torrent add reported OK but no torrent found for tag {}", tag);
                self.reply(origin, &not_registered_message("Torrent")).await;
            }
            Err(e) => {
                error!("Failed to add torrent {}: {}", file_name, e);
                self.reply(origin, &failure_message("torrent", &e)).await;
            }
        }
    }

    /// Submit a magnet for `origin` and store the job once the engine has it.
    pub async fn submit_magnet(
        &self,
        origin: &MessageOrigin,
        magnet: &str,
    ) -> Result<AcceptedJob, SubmitError> {
        let reservation = self.context.tags.next_tag()?;
        self.context
            .remote
            .submit_magnet(magnet, reservation.tag(), &self.context.settings.save_path)
            .await?;
        self.verify_and_persist(reservation, origin).await
    }

    /// Submit a .torrent file for `origin` and store the job once the engine has it.
    pub async fn submit_torrent_file(
        &self,
        origin: &MessageOrigin,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<AcceptedJob, SubmitError> {
        let reservation = self.context.tags.next_tag()?;
        self.context
            .remote
            .submit_file(
                file_name,
                content,
                reservation.tag(),
                &self.context.settings.save_path,
            )
            .await?;
        self.verify_and_persist(reservation, origin).await
    }

    /// Re-query the tag; the engine sometimes answers 200 without adding anything.
    async fn verify_and_persist(
        &self,
        reservation: TagReservation,
        origin: &MessageOrigin,
    ) -> Result<AcceptedJob, SubmitError> {
        let tag = reservation.tag();

        let statuses = match self.context.remote.query_by_tag(tag).await {
            Ok(statuses) => statuses,
            Err(e) => {
                warn!("Post-add check failed for {}: {}", tag, e);
                Vec::new()
            }
        };

        if statuses.is_empty() {
            return Err(SubmitError::VerificationMismatch {
                tag: tag.to_string(),
            });
        }

        self.context.store.add(tag, origin.chat_id)?;

        Ok(AcceptedJob {
            short_id: reservation.short_id().to_string(),
            tag: tag.to_string(),
            save_path: self.context.settings.save_path.clone(),
        })
    }

    /// Tags currently held by submissions still in flight.
    pub fn reserved_tags(&self) -> usize {
        self.context.tags.reserved_count()
    }

    async fn reply(&self, origin: &MessageOrigin, text: &str) {
        if let Err(e) = self.context.messenger.reply(origin, text).await {
            warn!("Failed to reply to chat {}: {}", origin.chat_id, e);
        }
    }
}

fn accepted_message(kind: &str, job: &AcceptedJob) -> String {
    format!(
        "✅ Added {}. ID <b>{}</b>\nSave path: <code>{}</code>",
        kind,
        job.short_id,
        escape_html(&job.save_path)
    )
}

fn not_registered_message(kind: &str) -> String {
    format!(
        "⚠️ {} was not added to qBittorrent. It may already exist or was rejected; check the qBittorrent UI and bot logs.",
        kind
    )
}

fn failure_message(kind: &str, error: &SubmitError) -> String {
    format!(
        "⚠️ Failed to add {}: <code>{}</code>",
        kind,
        escape_html(&error.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_magnet() {
        let text = "grab this please magnet:?xt=urn:btih:ABC123&dn=Some+Name thanks";
        assert_eq!(
            extract_magnet(text),
            Some("magnet:?xt=urn:btih:ABC123&dn=Some+Name")
        );
    }

    #[test]
    fn test_extract_magnet_case_insensitive() {
        assert_eq!(
            extract_magnet("MAGNET:?XT=URN:BTIH:abc"),
            Some("MAGNET:?XT=URN:BTIH:abc")
        );
    }

    #[test]
    fn test_extract_magnet_first_match_wins() {
        let text = "magnet:?xt=urn:btih:first\nmagnet:?xt=urn:btih:second";
        assert_eq!(extract_magnet(text), Some("magnet:?xt=urn:btih:first"));
    }

    #[test]
    fn test_extract_magnet_none() {
        assert_eq!(extract_magnet("hello"), None);
        assert_eq!(extract_magnet("magnet:?dn=missing-xt"), None);
        assert_eq!(extract_magnet("https://example.com/file.torrent"), None);
    }

    #[test]
    fn test_is_torrent_file_name() {
        assert!(is_torrent_file_name("ubuntu.torrent"));
        assert!(is_torrent_file_name("Ubuntu.TORRENT"));
        assert!(!is_torrent_file_name("ubuntu.torrent.txt"));
        assert!(!is_torrent_file_name("photo.jpg"));
        assert!(!is_torrent_file_name(""));
    }

    #[test]
    fn test_accepted_message() {
        let job = AcceptedJob {
            short_id: "1234".to_string(),
            tag: "id-1234".to_string(),
            save_path: "/media/<usb>".to_string(),
        };
        let msg = accepted_message("magnet", &job);
        assert!(msg.contains("Added magnet. ID <b>1234</b>"));
        assert!(msg.contains("<code>/media/&lt;usb&gt;</code>"));
    }
}
