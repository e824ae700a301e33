use serde::{Deserialize, Serialize};

use super::Id;

/// Projection of a registered user, just what the chat flow needs. Account
/// management lives in the main marketplace api.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    pub email: String,
}
