// handlers/courses.rs - /courses and /bootcamps/:id/courses

use axum::extract::{Path, RawQuery, State};
use serde_json::Value;

use super::{list_response, query_pairs, to_response};
use crate::database::models::Course;
use crate::error::ApiResult;
use crate::middleware::{ApiResponse, CurrentAccount, JsonPayload};
use crate::services::course_service;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<ApiResponse<Vec<Value>>> {
    let page = course_service::list(&state, &query_pairs(query)).await?;
    Ok(list_response(page))
}

pub async fn list_for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<Value>>> {
    let page = course_service::list_for_bootcamp(&state, &bootcamp_id).await?;
    Ok(list_response(page))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ApiResponse<Value>> {
    Ok(to_response(course_service::get(&state, &id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(bootcamp_id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<Course>> {
    Ok(ApiResponse::created(
        course_service::create(&state, &caller, &bootcamp_id, &payload).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<Course>> {
    Ok(to_response(course_service::update(&state, &caller, &id, &payload).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    course_service::delete(&state, &caller, &id).await?;
    Ok(ApiResponse::empty())
}
