//! Client-side synchronization layer. Native clients keep their chat list and
//! unread badge current by combining push notifications with periodic reloads;
//! this module owns the refresh cadence and the in-memory view state, while
//! the transport stays behind the [`ChatApi`] trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::chat::model::ChatDto;

mod inbox;
mod scheduler;

pub use inbox::Inbox;
pub use scheduler::{Refresh, RefreshScheduler};

/// Quiet window for the chat list view; pushes arriving within it collapse
/// into one reload.
pub const LIST_DEBOUNCE: Duration = Duration::from_millis(500);
/// Quiet window for the unread badge.
pub const BADGE_DEBOUNCE: Duration = Duration::from_millis(300);
/// Fallback polling cadence for the chat list.
pub const LIST_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Fallback polling cadence for the unread badge.
pub const BADGE_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("session is not authorized")]
    Unauthorized,
    #[error("transport failure: {0}")]
    Transport(String),
}

/// What the sync layer needs from the server. Implemented over HTTP in real
/// clients; tests script it directly.
#[async_trait]
pub trait ChatApi {
    /// One page of the caller's active chats, newest activity first. Pages
    /// are one-based, matching the server's pagination.
    async fn fetch_chats(&self, page: u64) -> Result<Vec<ChatDto>>;

    /// Aggregate unread count across all of the caller's chats.
    async fn fetch_unread_count(&self) -> Result<u64>;
}
