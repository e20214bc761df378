//! Remote download engine client.
//!
//! This module provides a `RemoteClient` trait for handing downloads to an
//! engine and asking it how tagged downloads are doing. qBittorrent's Web API
//! is the only backend.

mod qbittorrent;
mod reject;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use reject::RejectReason;
pub use types::*;
