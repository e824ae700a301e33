use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

/// Hex object id of a registered user.
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

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("user not found: {0}")]
    NotFound(Id),

    #[error(transparent)]
    _MongoDB(#[from] mongodb::error::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("{self}");

        let (status, message) = match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::_MongoDB(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            ),
        };

        (status, message).into_response()
    }
}
