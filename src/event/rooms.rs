use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::broadcast;
use tokio::sync::RwLock;

use crate::chat;

use super::model::RoomEvent;

const ROOM_CHANNEL_CAPACITY: usize = 64;

/// Fan-out channels, one per conversation with at least one subscribed
/// connection. Purely in-memory; a room exists only while someone is in it.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<RwLock<HashMap<chat::Id, broadcast::Sender<RoomEvent>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, chat_id: &chat::Id) -> broadcast::Receiver<RoomEvent> {
        let mut inner = self.inner.write().await;

        // sweep rooms everyone has left since the last publish touched them
        inner.retain(|_, sender| sender.receiver_count() > 0);

        inner
            .entry(chat_id.clone())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Delivers the event to every connection currently in the room, in send
    /// order. Publishing into an empty or unknown room is a no-op.
    pub async fn publish(&self, chat_id: &chat::Id, event: RoomEvent) {
        let mut inner = self.inner.write().await;

        if let Some(sender) = inner.get(chat_id) {
            if sender.send(event).is_err() {
                // last subscriber is gone, drop the room
                inner.remove(chat_id);
                debug!("room {chat_id} is empty, removed");
            }
        }
    }

    pub async fn reset(&self) {
        self.inner.write().await.clear();
    }
}
