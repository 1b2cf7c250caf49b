pub mod account_service;
pub mod aggregates;
pub mod bootcamp_service;
pub mod course_service;
pub mod listing;
pub mod review_service;
pub mod upload;
pub mod user_service;

pub use listing::ListPage;

use serde_json::Value;
use uuid::Uuid;

use crate::auth::{self, password::MIN_PASSWORD_LENGTH};
use crate::database::models::ValidationErrors;
use crate::error::{ApiError, ApiResult};

/// Path ids that fail to parse can never match a record, so they read as absent
pub fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::resource_not_found(what, raw))
}

pub fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

/// Validates a new plaintext password and hashes it off the async runtime
pub async fn hash_new_password(plaintext: &str, cost: u32, field: &str) -> ApiResult<String> {
    if plaintext.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationErrors::single(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        )
        .into());
    }
    let plaintext = plaintext.to_string();
    tokio::task::spawn_blocking(move || auth::hash_password(&plaintext, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Server Error")
        })?
        .map_err(ApiError::from)
}

pub async fn check_password(plaintext: &str, hash: &str) -> ApiResult<bool> {
    let (plaintext, hash) = (plaintext.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || auth::verify_password(&plaintext, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password check task failed: {}", e);
            ApiError::internal_server_error("Server Error")
        })
}
