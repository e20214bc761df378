//! qBittorrent Web API client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::QBittorrentConfig;

use super::reject::log_excerpt;
use super::{RejectReason, RemoteClient, RemoteClientError, TorrentStatus};

const LOGIN_ENDPOINT: &str = "/api/v2/auth/login";
const ADD_ENDPOINT: &str = "/api/v2/torrents/add";
const INFO_ENDPOINT: &str = "/api/v2/torrents/info";

/// Local view of the engine session.
///
/// The cookie itself lives in the HTTP client's jar; this only tracks when we
/// last logged in.
#[derive(Debug, Default)]
struct AuthSession {
    last_login: Option<Instant>,
}

impl AuthSession {
    /// A login within the cooldown is trusted without asking the engine.
    fn is_fresh(&self, cooldown: Duration) -> bool {
        self.last_login
            .map(|at| at.elapsed() < cooldown)
            .unwrap_or(false)
    }
}

/// qBittorrent client implementation.
///
/// One cookie-carrying HTTP client and one session are shared by every
/// operation, so a login triggered by one call benefits all concurrent ones.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    session: Mutex<AuthSession>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, RemoteClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| RemoteClientError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            session: Mutex::new(AuthSession::default()),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn login_cooldown(&self) -> Duration {
        Duration::from_secs(self.config.login_cooldown_secs)
    }

    /// Post credentials and record the login time on success.
    ///
    /// Must be called with the session lock held.
    async fn authenticate(&self, session: &mut AuthSession) -> Result<(), RemoteClientError> {
        info!(
            "qBittorrent: logging in to {} as {}",
            self.base_url(),
            self.config.username
        );

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint(LOGIN_ENDPOINT))
            .form(&params)
            .send()
            .await
            .map_err(RemoteClientError::from_transport)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let body = body.trim();
        debug!("qBittorrent login response: {} {}", status, body);

        if status == StatusCode::OK && body == "Ok." {
            session.last_login = Some(Instant::now());
            Ok(())
        } else {
            error!("qBittorrent auth failed: {} {}", status, log_excerpt(body, 100));
            Err(RemoteClientError::AuthenticationFailed(format!(
                "HTTP {} {}",
                status.as_u16(),
                log_excerpt(body, 100)
            )))
        }
    }

    /// Drop the cooldown so the next login really talks to the engine.
    async fn invalidate_session(&self) {
        self.session.lock().await.last_login = None;
    }

    /// Send a request built by `build`, logging in first.
    ///
    /// A 403 means the engine forgot our session: log in once more and retry
    /// a single time before handing the response back.
    async fn send_authenticated<F>(&self, build: F) -> Result<Response, RemoteClientError>
    where
        F: Fn(&Client) -> Result<RequestBuilder, RemoteClientError>,
    {
        self.login().await?;

        let response = build(&self.client)?
            .send()
            .await
            .map_err(RemoteClientError::from_transport)?;

        if response.status() != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        warn!("qBittorrent session expired, re-authenticating");
        self.invalidate_session().await;
        self.login().await?;

        build(&self.client)?
            .send()
            .await
            .map_err(RemoteClientError::from_transport)
    }

    /// Turn an add response into success or a classified rejection.
    async fn check_add_response(
        &self,
        response: Response,
        what: &str,
        tag: &str,
    ) -> Result<(), RemoteClientError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            info!("qBittorrent accepted {} for tag {}", what, tag);
            return Ok(());
        }

        let reason = RejectReason::classify(&body);
        error!(
            "qBittorrent rejected {} for tag {}: {} {} -- raw: {}",
            what,
            tag,
            status,
            reason,
            log_excerpt(&body, 500)
        );
        Err(RemoteClientError::SubmitRejected {
            status: status.as_u16(),
            reason,
        })
    }
}

/// Placeholder for entries the engine reports without a usable name.
const UNKNOWN_NAME: &str = "?";

/// Read a number that may arrive as a JSON number or a numeric string.
fn number_field(entry: &Value, key: &str) -> Option<f64> {
    match entry.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Map one `/torrents/info` entry, falling back per field.
fn status_from_entry(entry: &Value) -> TorrentStatus {
    let name = match entry.get("name") {
        Some(Value::String(name)) => name.clone(),
        _ => UNKNOWN_NAME.to_string(),
    };
    let progress = number_field(entry, "progress")
        .filter(|p| p.is_finite())
        .unwrap_or(0.0);
    let download_rate = number_field(entry, "dlspeed")
        .filter(|r| r.is_finite() && *r > 0.0)
        .map(|r| r as u64)
        .unwrap_or(0);

    TorrentStatus {
        name,
        progress,
        download_rate,
    }
}

/// Parse a `/torrents/info` body. Anything that is not a JSON list is "no news".
///
/// Entries are read one field at a time, so one odd entry cannot hide its
/// siblings.
fn parse_statuses(body: &str) -> Vec<TorrentStatus> {
    if body.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<Value>>(body) {
        Ok(entries) => entries
            .iter()
            .filter(|entry| entry.is_object())
            .map(status_from_entry)
            .collect(),
        Err(_) => {
            warn!("Non-JSON from /torrents/info: {}", log_excerpt(body, 120));
            Vec::new()
        }
    }
}

#[async_trait]
impl RemoteClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn login(&self) -> Result<(), RemoteClientError> {
        let mut session = self.session.lock().await;
        if session.is_fresh(self.login_cooldown()) {
            return Ok(());
        }
        self.authenticate(&mut session).await
    }

    async fn submit_magnet(
        &self,
        uri: &str,
        tag: &str,
        save_path: &str,
    ) -> Result<(), RemoteClientError> {
        let url = self.endpoint(ADD_ENDPOINT);
        let params = [("urls", uri), ("tags", tag), ("savepath", save_path)];

        let response = self
            .send_authenticated(|client| Ok(client.post(&url).form(&params)))
            .await?;

        self.check_add_response(response, "magnet", tag).await
    }

    async fn submit_file(
        &self,
        file_name: &str,
        content: Vec<u8>,
        tag: &str,
        save_path: &str,
    ) -> Result<(), RemoteClientError> {
        info!(
            "qBittorrent: uploading torrent '{}' tag={} savepath={}",
            file_name, tag, save_path
        );

        let url = self.endpoint(ADD_ENDPOINT);
        let response = self
            .send_authenticated(|client| {
                let file_part = multipart::Part::bytes(content.clone())
                    .file_name(file_name.to_string())
                    .mime_str("application/x-bittorrent")
                    .map_err(|e| RemoteClientError::InvalidTorrent(e.to_string()))?;

                let form = multipart::Form::new()
                    .text("tags", tag.to_string())
                    .text("savepath", save_path.to_string())
                    .part("torrents", file_part);

                Ok(client.post(&url).multipart(form))
            })
            .await?;

        self.check_add_response(response, "torrent file", tag).await
    }

    async fn query_by_tag(&self, tag: &str) -> Result<Vec<TorrentStatus>, RemoteClientError> {
        let url = format!(
            "{}?tag={}",
            self.endpoint(INFO_ENDPOINT),
            urlencoding::encode(tag)
        );

        let response = self
            .send_authenticated(|client| Ok(client.get(&url)))
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteClientError::ApiError(e.to_string()))?;

        if !status.is_success() {
            debug!("qBittorrent info for tag {} returned HTTP {}", tag, status);
            return Ok(Vec::new());
        }

        Ok(parse_statuses(&body))
    }
}
