use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use log::warn;

use crate::user;

use super::{Error, Result, TokenClaims};

/// Validates (and, for tooling and tests, issues) the HS256 bearer tokens the
/// marketplace hands out at login.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }
}

impl TokenService {
    pub fn issue(&self, sub: &user::Id) -> Result<String> {
        let claims = TokenClaims {
            sub: sub.clone(),
            exp: get_current_timestamp() + self.ttl.as_secs(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn validate(&self, token: &str) -> Result<user::Id> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                warn!("Failed to validate token: {e}");
                match e.kind() {
                    ErrorKind::ExpiredSignature => Error::TokenExpired,
                    ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                        Error::TokenMalformed
                    }
                    _ => Error::Unauthorized,
                }
            })
    }
}
