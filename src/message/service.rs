use std::sync::Arc;

use crate::chat;
use crate::chat::model::LastMessage;
use crate::chat::service::ChatService;
use crate::model::Pagination;
use crate::user;

use super::model::{ChatMessage, Kind, MessageDto};
use super::repository::MessageRepository;
use super::{Error, Result};

#[derive(Clone)]
pub struct MessageService {
    repository: Arc<dyn MessageRepository + Send + Sync>,
    chat_service: ChatService,
}

impl MessageService {
    pub fn new(
        repository: Arc<dyn MessageRepository + Send + Sync>,
        chat_service: ChatService,
    ) -> Self {
        Self {
            repository,
            chat_service,
        }
    }
}

impl MessageService {
    /// Persists a message from a verified participant and refreshes the
    /// chat's denormalized snapshot. The snapshot update is a separate write;
    /// under concurrent sends it is last-write-wins while both messages stay
    /// durably persisted.
    pub async fn create(
        &self,
        chat_id: &chat::Id,
        sender: &user::Id,
        content: &str,
        kind: Kind,
    ) -> Result<MessageDto> {
        if content.trim().is_empty() {
            return Err(Error::EmptyContent);
        }

        let message = ChatMessage::new(chat_id.clone(), sender.clone(), content, kind);
        self.repository.insert(&message).await?;

        self.chat_service
            .update_last_message(
                chat_id,
                &LastMessage {
                    content: message.content.clone(),
                    sender: sender.clone(),
                    sent_at: message.created_at,
                },
            )
            .await?;

        Ok(MessageDto::from(message))
    }

    /// Messages of a chat for a verified participant, oldest first. The
    /// repository pages newest-first so the latest page comes back first;
    /// each page is reversed for rendering.
    pub async fn find_by_chat_for(
        &self,
        chat_id: &chat::Id,
        member: &user::Id,
        pagination: Pagination,
    ) -> Result<Vec<MessageDto>> {
        self.chat_service.check_member(chat_id, member).await?;

        let mut messages = self.repository.find_by_chat(chat_id, pagination).await?;
        messages.reverse();

        Ok(messages.into_iter().map(MessageDto::from).collect())
    }
}
