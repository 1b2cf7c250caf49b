pub mod password;
pub mod reset;

pub use password::{hash_password, verify_password};
pub use reset::{hash_reset_token, issue_reset_token, ResetToken};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SessionConfig;

/// Session token claims: the account id and the validity window
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(account_id: Uuid, config: &SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(config.jwt_expiry_days)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub fn issue_session_token(account_id: Uuid, config: &SessionConfig) -> Result<String, AuthError> {
    encode_claims(&Claims::new(account_id, config), config)
}

fn encode_claims(claims: &Claims, config: &SessionConfig) -> Result<String, AuthError> {
    if config.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Verifies signature and expiry and returns the account id the token was issued for
pub fn verify_session_token(token: &str, config: &SessionConfig) -> Result<Uuid, AuthError> {
    if config.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Uuid::parse_str(&token_data.claims.sub).map_err(|_| AuthError::InvalidToken("subject is not an account id".into()))
}
