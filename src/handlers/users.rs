// handlers/users.rs - /accounts/users admin account management

use axum::extract::{Path, RawQuery, State};
use serde_json::Value;

use super::{list_response, query_pairs};
use crate::database::models::AccountProfile;
use crate::error::ApiResult;
use crate::middleware::{ApiResponse, CurrentAccount, JsonPayload};
use crate::services::user_service;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    RawQuery(query): RawQuery,
) -> ApiResult<ApiResponse<Vec<Value>>> {
    let page = user_service::list(&state, &caller, &query_pairs(query)).await?;
    Ok(list_response(page))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<AccountProfile>> {
    Ok(ApiResponse::success(user_service::get(&state, &caller, &id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<AccountProfile>> {
    Ok(ApiResponse::created(user_service::create(&state, &caller, &payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<AccountProfile>> {
    Ok(ApiResponse::success(user_service::update(&state, &caller, &id, &payload).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    user_service::delete(&state, &caller, &id).await?;
    Ok(ApiResponse::empty())
}
