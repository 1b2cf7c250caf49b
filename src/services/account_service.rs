//! Registration, login and the password lifecycle of the calling account.

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{check_password, hash_new_password, str_field};
use crate::auth::{hash_reset_token, issue_reset_token, issue_session_token};
use crate::database::models::account::normalize_email;
use crate::database::models::{merge_writable, Account, AccountProfile, Entity, Role, ValidationErrors};
use crate::error::{ApiError, ApiResult};
use crate::filter::FilterExpr;
use crate::outbound::Email;
use crate::state::AppState;

/// Keeps only the listed payload keys, lower-casing `email` on the way
pub(crate) fn account_patch(payload: &Value, keys: &[&str]) -> Value {
    let mut patch = Map::new();
    if let Some(object) = payload.as_object() {
        for key in keys {
            if let Some(value) = object.get(*key) {
                let value = match (*key, value) {
                    ("email", Value::String(email)) => Value::String(normalize_email(email)),
                    _ => value.clone(),
                };
                patch.insert(key.to_string(), value);
            }
        }
    }
    Value::Object(patch)
}

pub(crate) async fn find_by_email(state: &AppState, email: &str) -> ApiResult<Option<Account>> {
    let filter = FilterExpr::eq("email", normalize_email(email))?;
    Ok(state.accounts().select_one(&filter).await?)
}

/// Builds a new account from `payload` with its password hashed
pub(crate) async fn build_account(state: &AppState, payload: &Value, allow_admin: bool) -> ApiResult<Account> {
    let patch = account_patch(payload, &["name", "email", "role"]);
    if !allow_admin && patch.get("role") == Some(&json!(Role::Admin)) {
        return Err(ValidationErrors::single("role", "Role admin can not be chosen at registration").into());
    }
    let plaintext = str_field(payload, "password").unwrap_or_default();
    let hash = hash_new_password(plaintext, state.config.session.bcrypt_cost, "password").await?;

    let base = json!({
        "id": Uuid::new_v4(),
        "createdAt": Utc::now(),
        "password": hash,
    });
    Ok(merge_writable::<Account>(base, &patch)?)
}

pub async fn register(state: &AppState, payload: &Value) -> ApiResult<String> {
    let account = build_account(state, payload, false).await?;
    state.accounts().insert(&account).await?;
    info!(account_id = %account.id, role = %account.role, "registered account");
    Ok(issue_session_token(account.id, &state.config.session)?)
}

pub async fn login(state: &AppState, payload: &Value) -> ApiResult<String> {
    let (Some(email), Some(password)) = (str_field(payload, "email"), str_field(payload, "password")) else {
        return Err(ApiError::bad_request("Please provide an email and password"));
    };
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Please provide an email and password"));
    }

    let Some(account) = find_by_email(state, email).await? else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };
    if !check_password(password, &account.password).await? {
        warn!(account_id = %account.id, "Login attempt with wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    Ok(issue_session_token(account.id, &state.config.session)?)
}

pub fn me(account: &Account) -> AccountProfile {
    account.profile()
}

/// Name and email only; role and password have their own paths
pub async fn update_details(state: &AppState, account: &Account, payload: &Value) -> ApiResult<AccountProfile> {
    let patch = account_patch(payload, &["name", "email"]);
    let updated: Account = merge_writable(serde_json::to_value(account)?, &patch)?;
    if !state.accounts().update(&updated).await? {
        return Err(ApiError::resource_not_found("User", account.id));
    }
    Ok(updated.profile())
}

pub async fn update_password(state: &AppState, account: &Account, payload: &Value) -> ApiResult<String> {
    let current = str_field(payload, "currentPassword").unwrap_or_default();
    if !check_password(current, &account.password).await? {
        return Err(ApiError::unauthorized("Password is incorrect"));
    }
    let new_password = str_field(payload, "newPassword").unwrap_or_default();

    let mut updated = account.clone();
    updated.password = hash_new_password(new_password, state.config.session.bcrypt_cost, "newPassword").await?;
    state.accounts().update(&updated).await?;
    Ok(issue_session_token(updated.id, &state.config.session)?)
}

/// Issues a reset token and mails its plaintext. Returns the confirmation text.
pub async fn forgot_password(state: &AppState, payload: &Value) -> ApiResult<String> {
    let email = str_field(payload, "email").unwrap_or_default();
    let Some(mut account) = find_by_email(state, email).await? else {
        return Err(ApiError::not_found("There is no user with that email"));
    };

    let token = issue_reset_token(state.config.session.reset_token_expiry_minutes);
    account.reset_password_token = Some(token.hash.clone());
    account.reset_password_expire = Some(token.expires_at);
    let accounts = state.accounts();
    accounts.update(&account).await?;

    let reset_url = format!(
        "{}/accounts/password/reset/{}",
        state.config.server.public_url, token.plaintext
    );
    let email = Email {
        to: account.email.clone(),
        subject: "Password reset token".to_string(),
        body: format!(
            "You are receiving this email because you (or someone else) has requested the reset of a password. \
             Please make a PUT request to: \n\n {}",
            reset_url
        ),
    };

    if let Err(e) = state.mailer.send(email).await {
        account.clear_reset();
        accounts.update(&account).await?;
        return Err(e.into());
    }
    Ok("Email sent".to_string())
}

/// Consumes a reset token. Expired and unknown tokens fail identically.
pub async fn reset_password(state: &AppState, token: &str, payload: &Value) -> ApiResult<String> {
    let filter = FilterExpr::eq("resetPasswordToken", hash_reset_token(token))?;
    let accounts = state.accounts();
    let account = accounts
        .select_one(&filter)
        .await?
        .filter(|a| a.reset_password_expire.map_or(false, |exp| exp > Utc::now()));
    let Some(mut account) = account else {
        return Err(ApiError::bad_request("Invalid token"));
    };

    let password = str_field(payload, "password").unwrap_or_default();
    account.password = hash_new_password(password, state.config.session.bcrypt_cost, "password").await?;
    account.clear_reset();
    account.validate()?;
    accounts.update(&account).await?;
    info!(account_id = %account.id, "password reset");
    Ok(issue_session_token(account.id, &state.config.session)?)
}
