use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::error;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::user;

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

/// Hex object id of a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Id(pub String);

impl Id {
    pub fn random() -> Self {
        Self(ObjectId::new().to_hex())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn api<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/chats", post(handler::create).get(handler::find_all))
        .route("/chats/unread-count", get(handler::unread_count))
        .route("/chats/{id}", get(handler::find_one))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("chat not found: {0:?}")]
    NotFound(Option<Id>),
    #[error("not a participant of the chat")]
    NotParticipant,
    #[error("cannot start a chat with yourself")]
    SelfChat,

    #[error(transparent)]
    _User(#[from] user::Error),

    #[error(transparent)]
    _MongoDB(#[from] mongodb::error::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("{self}");

        let (status, message) = match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::NotParticipant => (StatusCode::FORBIDDEN, self.to_string()),
            Self::SelfChat => (StatusCode::BAD_REQUEST, self.to_string()),

            Self::_User(e) => return e.into_response(),

            Self::_MongoDB(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            ),
        };

        (status, message).into_response()
    }
}
