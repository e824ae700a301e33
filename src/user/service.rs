use std::sync::Arc;

use super::model::User;
use super::repository::UserRepository;
use super::{Error, Id, Result};

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { repository }
    }
}

impl UserService {
    pub async fn find_by_id(&self, id: &Id) -> Result<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(Error::NotFound(id.clone()))
    }

    /// Display name for a participant, or a placeholder when the account is
    /// gone. List rendering must not fail because one counterpart was removed.
    pub async fn display_name(&self, id: &Id) -> Result<String> {
        match self.repository.find_by_id(id).await? {
            Some(user) => Ok(user.name),
            None => Ok(String::from("Unknown user")),
        }
    }
}
