use std::sync::Arc;

use crate::message::repository::MessageRepository;
use crate::model::{now_millis, Pagination};
use crate::user;
use crate::user::service::UserService;

use super::model::{Chat, ChatDto, LastMessage, ParticipantDto};
use super::repository::ChatRepository;
use super::{Error, Id, Result};

#[derive(Clone)]
pub struct ChatService {
    repository: Arc<dyn ChatRepository + Send + Sync>,
    messages: Arc<dyn MessageRepository + Send + Sync>,
    users: UserService,
}

impl ChatService {
    pub fn new(
        repository: Arc<dyn ChatRepository + Send + Sync>,
        messages: Arc<dyn MessageRepository + Send + Sync>,
        users: UserService,
    ) -> Self {
        Self {
            repository,
            messages,
            users,
        }
    }
}

impl ChatService {
    /// Finds the conversation for (caller, recipient, product) or lazily
    /// creates it the first time a buyer reaches out.
    pub async fn find_or_create(
        &self,
        caller: &user::Id,
        recipient: &user::Id,
        product: Option<String>,
        title: Option<String>,
    ) -> Result<ChatDto> {
        if caller == recipient {
            return Err(Error::SelfChat);
        }

        self.users.find_by_id(recipient).await?;

        let members = [caller.clone(), recipient.clone()];
        let existing = self
            .repository
            .find_by_members_and_product(&members, product.as_deref())
            .await?;

        let chat = match existing {
            Some(chat) => chat,
            None => {
                let chat = Chat::new(caller.clone(), recipient.clone(), product, title)?;
                self.repository.insert(&chat).await?;
                chat
            }
        };

        self.to_dto(chat, caller).await
    }

    pub async fn find_all_for(
        &self,
        member: &user::Id,
        pagination: Pagination,
    ) -> Result<Vec<ChatDto>> {
        let chats = self
            .repository
            .find_active_by_member(member, Some(pagination))
            .await?;

        let mut dtos = Vec::with_capacity(chats.len());
        for chat in chats {
            dtos.push(self.to_dto(chat, member).await?);
        }

        Ok(dtos)
    }

    pub async fn find_one_for(&self, id: &Id, member: &user::Id) -> Result<ChatDto> {
        let chat = self.check_member(id, member).await?;
        self.to_dto(chat, member).await
    }

    /// Loads the chat and verifies membership. Every room operation goes
    /// through here first, so failures stay with the caller.
    pub async fn check_member(&self, id: &Id, member: &user::Id) -> Result<Chat> {
        let chat = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(Error::NotFound(Some(id.clone())))?;

        if !chat.is_participant(member) {
            return Err(Error::NotParticipant);
        }

        Ok(chat)
    }

    /// Admits a participant to the conversation: stamps their read marker and
    /// returns the chat as they should see it (unread count already zero).
    /// Re-entrant, a second join only refreshes the marker.
    pub async fn join(&self, id: &Id, member: &user::Id) -> Result<ChatDto> {
        let mut chat = self.check_member(id, member).await?;

        let read_at = chat.mark_read(member, now_millis())?;
        self.repository.update_last_read(id, member, read_at).await?;

        self.to_dto(chat, member).await
    }

    /// Stamps the participant's read marker and returns its new value.
    pub async fn mark_read(&self, id: &Id, member: &user::Id) -> Result<i64> {
        let mut chat = self.check_member(id, member).await?;

        let read_at = chat.mark_read(member, now_millis())?;
        self.repository.update_last_read(id, member, read_at).await?;

        Ok(read_at)
    }

    pub async fn update_last_message(&self, id: &Id, last: &LastMessage) -> Result<()> {
        self.repository.update_last_message(id, last).await?;
        Ok(())
    }
}

impl ChatService {
    /// Messages in this chat from other senders, newer than the member's read
    /// marker. Recomputed on every call, nothing is cached.
    pub async fn unread_count_in(&self, id: &Id, member: &user::Id) -> Result<u64> {
        let chat = self.check_member(id, member).await?;
        self.unread_in_chat(&chat, member).await
    }

    /// Aggregate unread count across all of the member's active chats.
    pub async fn unread_count_for(&self, member: &user::Id) -> Result<u64> {
        let chats = self.repository.find_active_by_member(member, None).await?;

        let mut total = 0;
        for chat in &chats {
            total += self.unread_in_chat(chat, member).await?;
        }

        Ok(total)
    }

    async fn unread_in_chat(&self, chat: &Chat, member: &user::Id) -> Result<u64> {
        let participant = chat.participant(member).ok_or(Error::NotParticipant)?;

        let count = self
            .messages
            .count_newer_than(&chat.id, member, participant.last_read_at)
            .await?;

        Ok(count)
    }

    async fn to_dto(&self, chat: Chat, viewer: &user::Id) -> Result<ChatDto> {
        let unread_count = self.unread_in_chat(&chat, viewer).await?;

        let mut participants = Vec::with_capacity(chat.participants.len());
        for p in &chat.participants {
            participants.push(ParticipantDto {
                user: p.user.clone(),
                name: self.users.display_name(&p.user).await?,
                last_read_at: p.last_read_at,
            });
        }

        Ok(ChatDto {
            id: chat.id,
            participants,
            product: chat.product,
            title: chat.title,
            last_message: chat.last_message,
            unread_count,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use crate::message::model::Kind;
    use crate::testkit::{test_user, Fixture};
    use crate::user;

    use super::super::Error;

    // wall-clock millisecond timestamps need a strict gap to count as newer
    async fn tick() {
        sleep(Duration::from_millis(2)).await;
    }

    #[tokio::test]
    async fn find_or_create_is_idempotent_per_pair_and_product() {
        let (a, b) = (test_user("Ana"), test_user("Boris"));
        let f = Fixture::with_users(vec![a.clone(), b.clone()]);

        let first = f
            .chat_service
            .find_or_create(&a.id, &b.id, Some("prod-1".into()), None)
            .await
            .unwrap();
        let second = f
            .chat_service
            .find_or_create(&a.id, &b.id, Some("prod-1".into()), None)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        // a different product opens a separate conversation
        let other = f
            .chat_service
            .find_or_create(&a.id, &b.id, Some("prod-2".into()), None)
            .await
            .unwrap();
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn rejects_self_chat() {
        let a = test_user("Ana");
        let f = Fixture::with_users(vec![a.clone()]);

        assert!(matches!(
            f.chat_service
                .find_or_create(&a.id, &a.id, None, None)
                .await,
            Err(Error::SelfChat)
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_recipient() {
        let a = test_user("Ana");
        let f = Fixture::with_users(vec![a.clone()]);

        assert!(matches!(
            f.chat_service
                .find_or_create(&a.id, &user::Id::random(), None, None)
                .await,
            Err(Error::_User(user::Error::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn counterpart_messages_count_as_unread() {
        let (a, b) = (test_user("Ana"), test_user("Boris"));
        let f = Fixture::with_users(vec![a.clone(), b.clone()]);

        let chat = f
            .chat_service
            .find_or_create(&a.id, &b.id, None, None)
            .await
            .unwrap();
        tick().await;

        for text in ["one", "two", "three"] {
            f.message_service
                .create(&chat.id, &b.id, text, Kind::Text)
                .await
                .unwrap();
        }

        assert_eq!(
            f.chat_service.unread_count_in(&chat.id, &a.id).await.unwrap(),
            3
        );
        // the sender's own messages never count against them
        assert_eq!(
            f.chat_service.unread_count_in(&chat.id, &b.id).await.unwrap(),
            0
        );

        let dto = f.chat_service.find_one_for(&chat.id, &a.id).await.unwrap();
        assert_eq!(dto.unread_count, 3);
    }

    #[tokio::test]
    async fn mark_read_resets_unread_until_the_next_message() {
        let (a, b) = (test_user("Ana"), test_user("Boris"));
        let f = Fixture::with_users(vec![a.clone(), b.clone()]);

        let chat = f
            .chat_service
            .find_or_create(&a.id, &b.id, None, None)
            .await
            .unwrap();
        tick().await;

        f.message_service
            .create(&chat.id, &b.id, "hello", Kind::Text)
            .await
            .unwrap();
        assert_eq!(
            f.chat_service.unread_count_in(&chat.id, &a.id).await.unwrap(),
            1
        );

        tick().await;
        f.chat_service.mark_read(&chat.id, &a.id).await.unwrap();
        assert_eq!(
            f.chat_service.unread_count_in(&chat.id, &a.id).await.unwrap(),
            0
        );

        tick().await;
        f.message_service
            .create(&chat.id, &b.id, "again", Kind::Text)
            .await
            .unwrap();
        assert_eq!(
            f.chat_service.unread_count_in(&chat.id, &a.id).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn join_reports_zero_unread() {
        let (a, b) = (test_user("Ana"), test_user("Boris"));
        let f = Fixture::with_users(vec![a.clone(), b.clone()]);

        let chat = f
            .chat_service
            .find_or_create(&a.id, &b.id, None, None)
            .await
            .unwrap();
        tick().await;

        f.message_service
            .create(&chat.id, &b.id, "hello", Kind::Text)
            .await
            .unwrap();
        tick().await;

        let joined = f.chat_service.join(&chat.id, &a.id).await.unwrap();
        assert_eq!(joined.unread_count, 0);

        // joining again is harmless
        let rejoined = f.chat_service.join(&chat.id, &a.id).await.unwrap();
        assert_eq!(rejoined.unread_count, 0);
    }

    #[tokio::test]
    async fn aggregate_unread_sums_over_all_chats() {
        let (a, b, c) = (test_user("Ana"), test_user("Boris"), test_user("Ceca"));
        let f = Fixture::with_users(vec![a.clone(), b.clone(), c.clone()]);

        let with_b = f
            .chat_service
            .find_or_create(&a.id, &b.id, None, None)
            .await
            .unwrap();
        let with_c = f
            .chat_service
            .find_or_create(&a.id, &c.id, None, None)
            .await
            .unwrap();
        tick().await;

        f.message_service
            .create(&with_b.id, &b.id, "from b", Kind::Text)
            .await
            .unwrap();
        f.message_service
            .create(&with_c.id, &c.id, "from c", Kind::Text)
            .await
            .unwrap();
        f.message_service
            .create(&with_c.id, &c.id, "more", Kind::Text)
            .await
            .unwrap();

        assert_eq!(f.chat_service.unread_count_for(&a.id).await.unwrap(), 3);
        assert_eq!(f.chat_service.unread_count_for(&b.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn access_is_fail_closed() {
        let (a, b, stranger) = (test_user("Ana"), test_user("Boris"), test_user("Zika"));
        let f = Fixture::with_users(vec![a.clone(), b.clone(), stranger.clone()]);

        let chat = f
            .chat_service
            .find_or_create(&a.id, &b.id, None, None)
            .await
            .unwrap();

        assert!(matches!(
            f.chat_service.find_one_for(&chat.id, &stranger.id).await,
            Err(Error::NotParticipant)
        ));
        assert!(matches!(
            f.chat_service.mark_read(&chat.id, &stranger.id).await,
            Err(Error::NotParticipant)
        ));
        assert!(matches!(
            f.chat_service
                .find_one_for(&crate::chat::Id::random(), &a.id)
                .await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn chat_list_orders_by_latest_activity() {
        let (a, b, c) = (test_user("Ana"), test_user("Boris"), test_user("Ceca"));
        let f = Fixture::with_users(vec![a.clone(), b.clone(), c.clone()]);

        let older = f
            .chat_service
            .find_or_create(&a.id, &b.id, None, None)
            .await
            .unwrap();
        tick().await;
        let newer = f
            .chat_service
            .find_or_create(&a.id, &c.id, None, None)
            .await
            .unwrap();
        tick().await;

        // activity in the older chat moves it to the top
        f.message_service
            .create(&older.id, &b.id, "bump", Kind::Text)
            .await
            .unwrap();

        let chats = f
            .chat_service
            .find_all_for(&a.id, Default::default())
            .await
            .unwrap();
        let ids: Vec<_> = chats.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }
}
