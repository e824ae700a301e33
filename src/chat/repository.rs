use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, to_bson, Bson};

use crate::model::Pagination;
use crate::user;

use super::model::{Chat, LastMessage};
use super::Id;

const CHATS_COLLECTION: &str = "chats";
const DEFAULT_LIMIT: i64 = 20;

#[async_trait]
pub trait ChatRepository {
    async fn insert(&self, chat: &Chat) -> Result<(), mongodb::error::Error>;

    async fn find_by_id(&self, id: &Id) -> Result<Option<Chat>, mongodb::error::Error>;

    /// The conversation between exactly this participant pair about this
    /// product, if one was ever started.
    async fn find_by_members_and_product(
        &self,
        members: &[user::Id; 2],
        product: Option<&str>,
    ) -> Result<Option<Chat>, mongodb::error::Error>;

    /// Active chats of a member, most recent message first. `None` pagination
    /// returns all of them (the aggregate unread count needs every chat).
    async fn find_active_by_member(
        &self,
        member: &user::Id,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Chat>, mongodb::error::Error>;

    /// Advances a participant's read marker. Monotonic: a stale `read_at`
    /// never moves the marker backwards.
    async fn update_last_read(
        &self,
        id: &Id,
        member: &user::Id,
        read_at: i64,
    ) -> Result<(), mongodb::error::Error>;

    /// Overwrites the last-message snapshot and bumps the message counter.
    /// Concurrent sends race last-write-wins on the snapshot.
    async fn update_last_message(
        &self,
        id: &Id,
        last: &LastMessage,
    ) -> Result<(), mongodb::error::Error>;
}

pub struct MongoChatRepository {
    collection: mongodb::Collection<Chat>,
}

impl MongoChatRepository {
    pub fn new(database: &mongodb::Database) -> Self {
        Self {
            collection: database.collection(CHATS_COLLECTION),
        }
    }
}

#[async_trait]
impl ChatRepository for MongoChatRepository {
    async fn insert(&self, chat: &Chat) -> Result<(), mongodb::error::Error> {
        self.collection.insert_one(chat).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &Id) -> Result<Option<Chat>, mongodb::error::Error> {
        self.collection.find_one(doc! { "_id": &id.0 }).await
    }

    async fn find_by_members_and_product(
        &self,
        members: &[user::Id; 2],
        product: Option<&str>,
    ) -> Result<Option<Chat>, mongodb::error::Error> {
        let product = product.map_or(Bson::Null, |p| Bson::String(p.to_owned()));

        self.collection
            .find_one(doc! {
                "participants.user": { "$all": [&members[0].0, &members[1].0] },
                "product": product,
            })
            .await
    }

    async fn find_active_by_member(
        &self,
        member: &user::Id,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Chat>, mongodb::error::Error> {
        let filter = doc! {
            "participants.user": &member.0,
            "is_active": true,
        };

        let mut find = self
            .collection
            .find(filter)
            .sort(doc! { "last_message.sent_at": -1, "created_at": -1 });

        if let Some(p) = pagination {
            find = find.skip(p.skip(DEFAULT_LIMIT)).limit(p.limit(DEFAULT_LIMIT));
        }

        find.await?.try_collect().await
    }

    async fn update_last_read(
        &self,
        id: &Id,
        member: &user::Id,
        read_at: i64,
    ) -> Result<(), mongodb::error::Error> {
        self.collection
            .update_one(
                doc! { "_id": &id.0, "participants.user": &member.0 },
                doc! { "$max": { "participants.$.last_read_at": read_at } },
            )
            .await?;
        Ok(())
    }

    async fn update_last_message(
        &self,
        id: &Id,
        last: &LastMessage,
    ) -> Result<(), mongodb::error::Error> {
        let last = to_bson(last)?;

        self.collection
            .update_one(
                doc! { "_id": &id.0 },
                doc! {
                    "$set": { "last_message": last, "updated_at": chrono::Utc::now().timestamp_millis() },
                    "$inc": { "message_count": 1 },
                },
            )
            .await?;
        Ok(())
    }
}
