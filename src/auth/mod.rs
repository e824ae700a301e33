use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::{Deserialize, Serialize};

use crate::user;

pub mod middleware;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

pub type Service = Arc<service::TokenService>;

/// Claims carried by the bearer token. `sub` is the user id issued by the
/// marketplace login flow; this service only validates.
#[derive(Deserialize, Serialize, Clone)]
pub struct TokenClaims {
    pub sub: user::Id,
    pub exp: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unauthorized to access the resource")]
    Unauthorized,
    #[error("token is malformed")]
    TokenMalformed,
    #[error("token is expired")]
    TokenExpired,

    #[error(transparent)]
    _JsonWebtoken(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("{self}");
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}
