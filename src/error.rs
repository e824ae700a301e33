use axum::response::{IntoResponse, Response};

use crate::{auth, chat, event, integration, message, user};

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Auth(#[from] auth::Error),
    _Chat(#[from] chat::Error),
    _Event(#[from] event::Error),
    _Integration(#[from] integration::Error),
    _Message(#[from] message::Error),
    _User(#[from] user::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::_Auth(e) => e.into_response(),
            Self::_Chat(e) => e.into_response(),
            Self::_Event(e) => e.into_response(),
            Self::_Integration(e) => e.into_response(),
            Self::_Message(e) => e.into_response(),
            Self::_User(e) => e.into_response(),
        }
    }
}
