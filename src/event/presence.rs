use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::broadcast;
use tokio::sync::RwLock;

use crate::user;

use super::model::Notification;

const PERSONAL_CHANNEL_CAPACITY: usize = 64;

/// Process-local record of who currently holds a live connection, and the
/// personal notification channel of each such user. Rebuilt from nothing on
/// restart; only the gateway writes to it, the room coordinator reads it to
/// pick the offline-notification fallback.
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    inner: Arc<RwLock<HashMap<user::Id, Entry>>>,
}

struct Entry {
    sender: broadcast::Sender<Notification>,
    connections: usize,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more live connection for the user and subscribes it to
    /// the user's personal channel. Multiple tabs share one channel.
    pub async fn connect(&self, user: &user::Id) -> broadcast::Receiver<Notification> {
        let mut inner = self.inner.write().await;

        let entry = inner.entry(user.clone()).or_insert_with(|| Entry {
            sender: broadcast::channel(PERSONAL_CHANNEL_CAPACITY).0,
            connections: 0,
        });
        entry.connections += 1;

        debug!("user {user} connected ({} connection(s))", entry.connections);
        entry.sender.subscribe()
    }

    /// Drops one live connection; the user goes offline when the last one is
    /// gone.
    pub async fn disconnect(&self, user: &user::Id) {
        let mut inner = self.inner.write().await;

        if let Some(entry) = inner.get_mut(user) {
            entry.connections -= 1;
            if entry.connections == 0 {
                inner.remove(user);
                debug!("user {user} fully disconnected");
            }
        }
    }

    pub async fn is_online(&self, user: &user::Id) -> bool {
        self.inner.read().await.contains_key(user)
    }

    /// Best-effort push to every connection of one user. Nothing happens when
    /// the user is offline.
    pub async fn notify(&self, user: &user::Id, notification: Notification) {
        if let Some(entry) = self.inner.read().await.get(user) {
            let _ = entry.sender.send(notification);
        }
    }

    /// Drops all entries. Test teardown hook.
    pub async fn reset(&self) {
        self.inner.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::user;

    use super::super::model::Notification;
    use super::PresenceRegistry;

    #[tokio::test]
    async fn user_is_online_while_any_connection_lives() {
        let presence = PresenceRegistry::new();
        let user = user::Id::random();

        let _tab_a = presence.connect(&user).await;
        let _tab_b = presence.connect(&user).await;
        assert!(presence.is_online(&user).await);

        presence.disconnect(&user).await;
        assert!(presence.is_online(&user).await);

        presence.disconnect(&user).await;
        assert!(!presence.is_online(&user).await);
    }

    #[tokio::test]
    async fn notify_reaches_every_connection_of_the_user() {
        let presence = PresenceRegistry::new();
        let user = user::Id::random();

        let mut tab_a = presence.connect(&user).await;
        let mut tab_b = presence.connect(&user).await;

        presence
            .notify(
                &user,
                Notification::Error {
                    message: "ping".into(),
                },
            )
            .await;

        assert!(matches!(tab_a.recv().await, Ok(Notification::Error { .. })));
        assert!(matches!(tab_b.recv().await, Ok(Notification::Error { .. })));
    }

    #[tokio::test]
    async fn notify_to_offline_user_is_a_noop() {
        let presence = PresenceRegistry::new();

        // must not panic or block
        presence
            .notify(
                &user::Id::random(),
                Notification::Error {
                    message: "ping".into(),
                },
            )
            .await;
    }

    #[tokio::test]
    async fn reset_clears_all_entries() {
        let presence = PresenceRegistry::new();
        let user = user::Id::random();

        let _conn = presence.connect(&user).await;
        presence.reset().await;

        assert!(!presence.is_online(&user).await);
    }
}
