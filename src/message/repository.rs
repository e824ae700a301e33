use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;

use crate::chat;
use crate::model::Pagination;
use crate::user;

use super::model::ChatMessage;

const MESSAGES_COLLECTION: &str = "chat_messages";
const DEFAULT_LIMIT: i64 = 50;

#[async_trait]
pub trait MessageRepository {
    async fn insert(&self, message: &ChatMessage) -> Result<(), mongodb::error::Error>;

    /// A page of messages in the chat, newest first.
    async fn find_by_chat(
        &self,
        chat_id: &chat::Id,
        pagination: Pagination,
    ) -> Result<Vec<ChatMessage>, mongodb::error::Error>;

    /// Messages in the chat from senders other than `reader` created strictly
    /// after `after`. This is the whole unread-count story; no counter is
    /// stored anywhere.
    async fn count_newer_than(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        after: i64,
    ) -> Result<u64, mongodb::error::Error>;
}

pub struct MongoMessageRepository {
    collection: mongodb::Collection<ChatMessage>,
}

impl MongoMessageRepository {
    pub fn new(database: &mongodb::Database) -> Self {
        Self {
            collection: database.collection(MESSAGES_COLLECTION),
        }
    }
}

#[async_trait]
impl MessageRepository for MongoMessageRepository {
    async fn insert(&self, message: &ChatMessage) -> Result<(), mongodb::error::Error> {
        self.collection.insert_one(message).await?;
        Ok(())
    }

    async fn find_by_chat(
        &self,
        chat_id: &chat::Id,
        pagination: Pagination,
    ) -> Result<Vec<ChatMessage>, mongodb::error::Error> {
        self.collection
            .find(doc! { "chat_id": &chat_id.0 })
            .sort(doc! { "created_at": -1 })
            .skip(pagination.skip(DEFAULT_LIMIT))
            .limit(pagination.limit(DEFAULT_LIMIT))
            .await?
            .try_collect()
            .await
    }

    async fn count_newer_than(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        after: i64,
    ) -> Result<u64, mongodb::error::Error> {
        self.collection
            .count_documents(doc! {
                "chat_id": &chat_id.0,
                "sender": { "$ne": &reader.0 },
                "created_at": { "$gt": after },
            })
            .await
    }
}
