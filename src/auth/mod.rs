use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;

/// Identity claim carried by a bearer token. Lives for one request;
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_idx: i64,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_idx: i64, is_admin: bool) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user_idx,
            is_admin,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad signature, malformed token, expired token, or a payload that
    /// does not decode into the claim shape. Deliberately one kind: the
    /// caller never learns which check failed.
    #[error("invalid token")]
    InvalidToken,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

pub fn sign_token(claims: &Claims) -> Result<String, AuthError> {
    sign_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn verify_token(token: &str) -> Result<Claims, AuthError> {
    verify_with_secret(token, &config::config().security.jwt_secret)
}

fn sign_with_secret(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

fn verify_with_secret(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}
