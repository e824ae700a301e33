use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::error;

use crate::state::AppState;
use crate::{auth, chat, message, user};

pub mod context;
mod handler;
pub mod model;
pub mod presence;
pub mod rooms;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

pub fn endpoints<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/ws", get(handler::ws))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Auth(#[from] auth::Error),
    _Chat(#[from] chat::Error),
    _Message(#[from] message::Error),
    _User(#[from] user::Error),

    _ParseJson(#[from] serde_json::Error),
}

impl Error {
    /// What the offending connection gets to see. Infrastructure failures are
    /// not leaked to clients.
    pub fn client_message(&self) -> String {
        fn chat_message(e: &chat::Error) -> String {
            match e {
                chat::Error::NotFound(_) => "chat not found".into(),
                chat::Error::NotParticipant => "not authorized to access this chat".into(),
                chat::Error::SelfChat => e.to_string(),
                chat::Error::_User(user::Error::NotFound(_)) => "user not found".into(),
                _ => "internal error".into(),
            }
        }

        match self {
            Self::_Auth(e) => e.to_string(),
            Self::_Chat(e) => chat_message(e),
            Self::_Message(message::Error::EmptyContent) => "message content is empty".into(),
            Self::_Message(message::Error::_Chat(e)) => chat_message(e),
            Self::_User(user::Error::NotFound(_)) => "user not found".into(),
            Self::_ParseJson(_) => "malformed payload".into(),
            _ => "internal error".into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("{self}");

        match self {
            Self::_Auth(e) => e.into_response(),
            Self::_User(e) => e.into_response(),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
        }
    }
}
