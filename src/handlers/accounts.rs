// handlers/accounts.rs - /accounts/* registration, login and password lifecycle

use axum::extract::{Path, State};
use serde_json::Value;

use crate::database::models::AccountProfile;
use crate::error::ApiResult;
use crate::middleware::{ApiResponse, CurrentAccount, JsonPayload};
use crate::services::account_service;
use crate::state::AppState;

/// POST /accounts/register
pub async fn register(State(state): State<AppState>, JsonPayload(payload): JsonPayload) -> ApiResult<ApiResponse<Value>> {
    let token = account_service::register(&state, &payload).await?;
    Ok(ApiResponse::token(token))
}

/// POST /accounts/login
pub async fn login(State(state): State<AppState>, JsonPayload(payload): JsonPayload) -> ApiResult<ApiResponse<Value>> {
    let token = account_service::login(&state, &payload).await?;
    Ok(ApiResponse::token(token))
}

/// GET /accounts/me
pub async fn me(CurrentAccount(account): CurrentAccount) -> ApiResponse<AccountProfile> {
    ApiResponse::success(account_service::me(&account))
}

/// PUT /accounts/me/details
pub async fn update_details(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<AccountProfile>> {
    let profile = account_service::update_details(&state, &account, &payload).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /accounts/me/password
pub async fn update_password(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<Value>> {
    let token = account_service::update_password(&state, &account, &payload).await?;
    Ok(ApiResponse::token(token))
}

/// POST /accounts/password/forgot
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<String>> {
    let message = account_service::forgot_password(&state, &payload).await?;
    Ok(ApiResponse::success(message))
}

/// PUT /accounts/password/reset/:token
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<Value>> {
    let token = account_service::reset_password(&state, &token, &payload).await?;
    Ok(ApiResponse::token(token))
}
