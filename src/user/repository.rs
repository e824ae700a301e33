use async_trait::async_trait;
use mongodb::bson::doc;

use super::Id;
use super::model::User;

const USERS_COLLECTION: &str = "users";

#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Id) -> Result<Option<User>, mongodb::error::Error>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(database: &mongodb::Database) -> Self {
        Self {
            collection: database.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_id(&self, id: &Id) -> Result<Option<User>, mongodb::error::Error> {
        self.collection.find_one(doc! { "_id": &id.0 }).await
    }
}
