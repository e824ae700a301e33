use crate::chat;
use crate::chat::model::ChatDto;

use super::{ChatApi, Error, Result};

/// In-memory chat list and unread badge of one signed-in client. All methods
/// mutate local state only; the server round trips go through the injected
/// [`ChatApi`].
pub struct Inbox<A> {
    api: A,
    chats: Vec<ChatDto>,
    unread_count: u64,
    next_page: u64,
    selected: Option<chat::Id>,
}

impl<A: ChatApi> Inbox<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            chats: Vec::new(),
            unread_count: 0,
            next_page: 1,
            selected: None,
        }
    }

    pub fn chats(&self) -> &[ChatDto] {
        &self.chats
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn selected(&self) -> Option<&chat::Id> {
        self.selected.as_ref()
    }

    /// Initial load of the first page. Unlike [`refresh`](Self::refresh) a
    /// failure here is surfaced: with nothing on screen yet there is no stale
    /// state to fall back on.
    pub async fn load(&mut self) -> Result<()> {
        let page = self.api.fetch_chats(1).await?;

        self.chats.clear();
        self.merge(page);
        self.next_page = 2;

        Ok(())
    }

    /// Background reload of the first page. On failure the previous list
    /// stays on screen untouched.
    pub async fn refresh(&mut self) {
        if let Ok(page) = self.api.fetch_chats(1).await {
            self.merge(page);
        }
    }

    /// Fetches and appends the next page. Chats already known keep their
    /// position and are updated in place, so a chat that moved between pages
    /// on the server never shows up twice.
    pub async fn load_more(&mut self) -> Result<()> {
        let page = self.api.fetch_chats(self.next_page).await?;

        if !page.is_empty() {
            self.merge(page);
            self.next_page += 1;
        }

        Ok(())
    }

    /// Marks a chat as the one being viewed and clears its unread counter
    /// locally, ahead of the server acknowledging the read. The next refresh
    /// reconciles with the server's numbers.
    pub fn select_chat(&mut self, chat_id: &chat::Id) {
        self.selected = Some(chat_id.clone());

        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == *chat_id) {
            self.unread_count = self.unread_count.saturating_sub(chat.unread_count);
            chat.unread_count = 0;
        }
    }

    /// Refetches the aggregate unread badge. An expired or revoked session
    /// reads as zero (nothing unread for someone who is signed out); a
    /// transport failure keeps the previous value.
    pub async fn refresh_unread(&mut self) {
        match self.api.fetch_unread_count().await {
            Ok(count) => self.unread_count = count,
            Err(Error::Unauthorized) => self.unread_count = 0,
            Err(Error::Transport(_)) => {}
        }
    }

    fn merge(&mut self, page: Vec<ChatDto>) {
        for incoming in page {
            match self.chats.iter_mut().find(|c| c.id == incoming.id) {
                Some(existing) => *existing = incoming,
                None => self.chats.push(incoming),
            }
        }
    }
}
