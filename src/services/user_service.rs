//! Account management for admins.

use serde_json::Value;
use tracing::info;

use super::account_service::{account_patch, build_account};
use super::listing::{run_listing, ListPage};
use super::{hash_new_password, parse_id, str_field};
use crate::database::models::{merge_writable, Account, AccountProfile, Role};
use crate::database::Collection;
use crate::error::{ApiError, ApiResult};
use crate::middleware::authorize;
use crate::state::AppState;

const ADMIN_ONLY: &[Role] = &[Role::Admin];

async fn load(state: &AppState, raw_id: &str) -> ApiResult<Account> {
    let id = parse_id(raw_id, "User")?;
    state
        .accounts()
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found("User", raw_id))
}

pub async fn list(state: &AppState, caller: &Account, params: &[(String, String)]) -> ApiResult<ListPage> {
    authorize(caller, ADMIN_ONLY)?;
    run_listing(state, Collection::Accounts, params, &[]).await
}

pub async fn get(state: &AppState, caller: &Account, raw_id: &str) -> ApiResult<AccountProfile> {
    authorize(caller, ADMIN_ONLY)?;
    Ok(load(state, raw_id).await?.profile())
}

pub async fn create(state: &AppState, caller: &Account, payload: &Value) -> ApiResult<AccountProfile> {
    authorize(caller, ADMIN_ONLY)?;
    let account = build_account(state, payload, true).await?;
    state.accounts().insert(&account).await?;
    info!(account_id = %account.id, by = %caller.id, "admin created account");
    Ok(account.profile())
}

/// Name, email and role; a `password` in the payload is re-hashed
pub async fn update(state: &AppState, caller: &Account, raw_id: &str, payload: &Value) -> ApiResult<AccountProfile> {
    authorize(caller, ADMIN_ONLY)?;
    let existing = load(state, raw_id).await?;

    let patch = account_patch(payload, &["name", "email", "role"]);
    let mut updated: Account = merge_writable(serde_json::to_value(&existing)?, &patch)?;
    if let Some(password) = str_field(payload, "password") {
        updated.password = hash_new_password(password, state.config.session.bcrypt_cost, "password").await?;
    }
    if !state.accounts().update(&updated).await? {
        return Err(ApiError::resource_not_found("User", raw_id));
    }
    Ok(updated.profile())
}

pub async fn delete(state: &AppState, caller: &Account, raw_id: &str) -> ApiResult<()> {
    authorize(caller, ADMIN_ONLY)?;
    let existing = load(state, raw_id).await?;
    state.accounts().delete(existing.id).await?;
    info!(account_id = %existing.id, by = %caller.id, "admin deleted account");
    Ok(())
}
