use serde::{Deserialize, Serialize};

use crate::chat;
use crate::model::now_millis;
use crate::user;

use super::Id;

const DELETED_PLACEHOLDER: &str = "This message was deleted";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    #[default]
    Text,
    Image,
    File,
    System,
}

/// A persisted unit of communication. Content is immutable once sent except
/// for the explicit edit and soft-delete markers; rows are never removed.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub id: Id,
    pub chat_id: chat::Id,
    pub sender: user::Id,
    pub content: String,
    pub kind: Kind,
    pub is_edited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

impl ChatMessage {
    pub fn new(chat_id: chat::Id, sender: user::Id, content: &str, kind: Kind) -> Self {
        Self {
            id: Id::random(),
            chat_id,
            sender,
            content: content.trim().to_string(),
            kind,
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now_millis(),
        }
    }

    /// What clients render: soft-deleted messages keep their row but show a
    /// fixed placeholder.
    pub fn display_content(&self) -> &str {
        if self.is_deleted {
            DELETED_PLACEHOLDER
        } else {
            &self.content
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MessageDto {
    pub id: Id,
    pub chat_id: chat::Id,
    pub sender: user::Id,
    pub content: String,
    pub kind: Kind,
    pub is_edited: bool,
    pub created_at: i64,
}

impl From<ChatMessage> for MessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            content: message.display_content().to_string(),
            id: message.id,
            chat_id: message.chat_id,
            sender: message.sender,
            kind: message.kind,
            is_edited: message.is_edited,
            created_at: message.created_at,
        }
    }
}
