//! Telegram Bot API adapter.

mod api;
mod poller;
mod types;

pub use api::TelegramApi;
pub use poller::Poller;
