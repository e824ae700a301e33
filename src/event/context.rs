use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

use crate::chat;
use crate::user;
use crate::user::model::User;

use super::model::{Notification, RoomEvent};

/// Everything the 'write' half of a connection can be told to do by the
/// 'read' half.
pub enum Outbound {
    /// Push a notification to this connection only.
    Notify(Notification),
    /// Start draining a room the connection just joined.
    Subscribe(chat::Id, broadcast::Receiver<RoomEvent>),
    /// Stop draining a room the connection left.
    Unsubscribe(chat::Id),
}

/// Per-connection state shared between the read and write tasks. Cloning is
/// cheap; every clone refers to the same connection.
#[derive(Clone)]
pub struct Ws {
    pub connection_id: Uuid,
    pub user: User,
    joined: Arc<RwLock<HashSet<chat::Id>>>,
    outbound: mpsc::UnboundedSender<Outbound>,
    pub close: Arc<Notify>,
}

impl Ws {
    pub fn new(user: User) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let ctx = Self {
            connection_id: Uuid::new_v4(),
            user,
            joined: Arc::new(RwLock::new(HashSet::new())),
            outbound,
            close: Arc::new(Notify::new()),
        };
        (ctx, rx)
    }

    pub fn user_id(&self) -> &user::Id {
        &self.user.id
    }

    /// Records the room membership and hands the subscription over to the
    /// write task. Returns false if the connection was already in the room.
    pub async fn join(&self, chat_id: &chat::Id, rx: broadcast::Receiver<RoomEvent>) -> bool {
        let mut joined = self.joined.write().await;
        if !joined.insert(chat_id.clone()) {
            return false;
        }
        let _ = self.outbound.send(Outbound::Subscribe(chat_id.clone(), rx));
        true
    }

    pub async fn leave(&self, chat_id: &chat::Id) -> bool {
        let mut joined = self.joined.write().await;
        if !joined.remove(chat_id) {
            return false;
        }
        let _ = self.outbound.send(Outbound::Unsubscribe(chat_id.clone()));
        true
    }

    pub async fn has_joined(&self, chat_id: &chat::Id) -> bool {
        self.joined.read().await.contains(chat_id)
    }

    /// Best-effort push to this connection. Fails silently once the write
    /// task is gone, which only happens when the socket is closing anyway.
    pub fn notify(&self, notification: Notification) {
        let _ = self.outbound.send(Outbound::Notify(notification));
    }
}
