use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat;
use crate::chat::model::ChatDto;
use crate::message::model::{Kind, MessageDto};
use crate::user;

/// Client-to-server events. The envelope tag is `type`, so the message kind
/// travels under `kind`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    JoinChat {
        chat_id: chat::Id,
    },
    LeaveChat {
        chat_id: chat::Id,
    },
    SendMessage {
        chat_id: chat::Id,
        content: String,
        #[serde(default)]
        kind: Kind,
    },
    MarkAsRead {
        chat_id: chat::Id,
    },
    Typing {
        chat_id: chat::Id,
        is_typing: bool,
    },
}

/// Server-to-client events, same envelope.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ChatJoined {
        chat_id: chat::Id,
        chat: ChatDto,
    },
    NewMessage {
        message: MessageDto,
    },
    MessageRead {
        chat_id: chat::Id,
        user_id: user::Id,
        read_at: i64,
    },
    UserTyping {
        user_id: user::Id,
        user_name: String,
        is_typing: bool,
    },
    Error {
        message: String,
    },
}

/// A notification fanned out through a chat room. `origin` set means "skip
/// the connection that caused this" (read receipts, typing); unset events go
/// to every subscribed connection, the sender's own tabs included.
#[derive(Clone, Debug)]
pub struct RoomEvent {
    pub origin: Option<Uuid>,
    pub notification: Notification,
}

impl RoomEvent {
    pub fn broadcast(notification: Notification) -> Self {
        Self {
            origin: None,
            notification,
        }
    }

    pub fn from_connection(origin: Uuid, notification: Notification) -> Self {
        Self {
            origin: Some(origin),
            notification,
        }
    }

    pub fn skips(&self, connection: Uuid) -> bool {
        self.origin == Some(connection)
    }
}
