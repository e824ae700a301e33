//! In-memory doubles for the persistence and mail boundaries, letting the
//! service layer be exercised without a database.

use std::cmp::Reverse;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::chat;
use crate::chat::model::{Chat, LastMessage};
use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::integration::mail::{Mail, MailSender};
use crate::message::model::ChatMessage;
use crate::message::repository::MessageRepository;
use crate::message::service::MessageService;
use crate::model::Pagination;
use crate::user;
use crate::user::model::User;
use crate::user::repository::UserRepository;
use crate::user::service::UserService;

const CHATS_PAGE: i64 = 20;
const MESSAGES_PAGE: i64 = 50;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &user::Id) -> Result<Option<User>, mongodb::error::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == *id)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    chats: Mutex<Vec<Chat>>,
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn insert(&self, chat: &Chat) -> Result<(), mongodb::error::Error> {
        self.chats.lock().unwrap().push(chat.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &chat::Id) -> Result<Option<Chat>, mongodb::error::Error> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == *id)
            .cloned())
    }

    async fn find_by_members_and_product(
        &self,
        members: &[user::Id; 2],
        product: Option<&str>,
    ) -> Result<Option<Chat>, mongodb::error::Error> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| {
                members.iter().all(|m| c.is_participant(m)) && c.product.as_deref() == product
            })
            .cloned())
    }

    async fn find_active_by_member(
        &self,
        member: &user::Id,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Chat>, mongodb::error::Error> {
        let mut chats: Vec<Chat> = self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_active && c.is_participant(member))
            .cloned()
            .collect();

        chats.sort_by_key(|c| {
            let last = c.last_message.as_ref().map_or(i64::MIN, |l| l.sent_at);
            Reverse((last, c.created_at))
        });

        if let Some(p) = pagination {
            chats = chats
                .into_iter()
                .skip(p.skip(CHATS_PAGE) as usize)
                .take(p.limit(CHATS_PAGE) as usize)
                .collect();
        }

        Ok(chats)
    }

    async fn update_last_read(
        &self,
        id: &chat::Id,
        member: &user::Id,
        read_at: i64,
    ) -> Result<(), mongodb::error::Error> {
        let mut chats = self.chats.lock().unwrap();

        if let Some(chat) = chats.iter_mut().find(|c| c.id == *id) {
            let _ = chat.mark_read(member, read_at);
        }

        Ok(())
    }

    async fn update_last_message(
        &self,
        id: &chat::Id,
        last: &LastMessage,
    ) -> Result<(), mongodb::error::Error> {
        let mut chats = self.chats.lock().unwrap();

        if let Some(chat) = chats.iter_mut().find(|c| c.id == *id) {
            chat.register_message(last.clone());
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &ChatMessage) -> Result<(), mongodb::error::Error> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn find_by_chat(
        &self,
        chat_id: &chat::Id,
        pagination: Pagination,
    ) -> Result<Vec<ChatMessage>, mongodb::error::Error> {
        let mut messages: Vec<ChatMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == *chat_id)
            .cloned()
            .collect();

        messages.sort_by_key(|m| Reverse(m.created_at));

        Ok(messages
            .into_iter()
            .skip(pagination.skip(MESSAGES_PAGE) as usize)
            .take(pagination.limit(MESSAGES_PAGE) as usize)
            .collect())
    }

    async fn count_newer_than(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        after: i64,
    ) -> Result<u64, mongodb::error::Error> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == *chat_id && m.sender != *reader && m.created_at > after)
            .count() as u64)
    }
}

/// Records every mail instead of delivering anything.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Mail>>,
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, mail: &Mail) -> crate::integration::Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub fn test_user(name: &str) -> User {
    User {
        id: user::Id::random(),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

/// Fully wired service stack over the in-memory doubles.
pub struct Fixture {
    pub chat_service: ChatService,
    pub message_service: MessageService,
    pub user_service: UserService,
    pub mailer: Arc<RecordingMailer>,
}

impl Fixture {
    pub fn with_users(users: Vec<User>) -> Self {
        let user_service =
            UserService::new(Arc::new(InMemoryUserRepository::with_users(users)));

        let message_repository = Arc::new(InMemoryMessageRepository::default());
        let chat_service = ChatService::new(
            Arc::new(InMemoryChatRepository::default()),
            message_repository.clone(),
            user_service.clone(),
        );
        let message_service = MessageService::new(message_repository, chat_service.clone());

        Self {
            chat_service,
            message_service,
            user_service,
            mailer: Arc::new(RecordingMailer::default()),
        }
    }
}
