mod telegram;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torrelay_core::{
    load_config, validate_config, JobStore, JobWatcher, Messenger, QBittorrentClient,
    RelayContext, RelaySettings, RemoteClient, SanitizedConfig, SqliteJobStore, SubmissionHandler,
};

use telegram::{Poller, TelegramApi};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "torrelay.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("torrelay {} starting", VERSION);

    // Determine config path
    let config_path = resolve_config_path();
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No config file found, using environment only"),
    }

    let config = load_config(config_path.as_deref()).context("Failed to load config")?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        "Effective config: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let store: Arc<dyn JobStore> = Arc::new(
        SqliteJobStore::new(&config.database.path).context("Failed to open job store")?,
    );
    info!("Job store initialized at {:?}", config.database.path);

    info!("Initializing qBittorrent client at {}", config.qbittorrent.url);
    let remote: Arc<dyn RemoteClient> = Arc::new(
        QBittorrentClient::new(config.qbittorrent.clone())
            .context("Failed to create qBittorrent client")?,
    );
    info!("Remote engine backend: {}", remote.name());

    let api =
        Arc::new(TelegramApi::new(&config.telegram).context("Failed to create bot client")?);
    let messenger: Arc<dyn Messenger> = Arc::clone(&api) as Arc<dyn Messenger>;

    let context = Arc::new(RelayContext::new(
        remote,
        store,
        messenger,
        RelaySettings::from_config(&config),
    ));

    // Reconcile, then keep watching in the background
    let watcher = Arc::new(JobWatcher::new(Arc::clone(&context), config.watcher.clone()));
    watcher.start().await;
    info!("Job watcher started");

    let handler = Arc::new(SubmissionHandler::new(context));
    let poller = Poller::new(api, handler);

    poller.run(shutdown_signal()).await;

    info!("Shutting down...");
    watcher.stop();
    info!("Job watcher stopped");

    Ok(())
}

/// `TORRELAY_CONFIG` if set, else `torrelay.toml` when present.
fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("TORRELAY_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    default.exists().then(|| default.to_path_buf())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
