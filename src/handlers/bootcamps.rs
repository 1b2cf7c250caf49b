// handlers/bootcamps.rs - /bootcamps resource, radius search and photo upload

use axum::extract::{Multipart, Path, RawQuery, State};
use serde_json::Value;

use super::{list_response, query_pairs, to_response};
use crate::database::models::Bootcamp;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiResponse, CurrentAccount, JsonPayload};
use crate::services::upload::{self, PhotoUpload};
use crate::services::bootcamp_service;
use crate::state::AppState;

/// Multipart field carrying the photo
const PHOTO_FIELD: &str = "file";

/// GET /bootcamps
pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<ApiResponse<Vec<Value>>> {
    let page = bootcamp_service::list(&state, &query_pairs(query)).await?;
    Ok(list_response(page))
}

/// GET /bootcamps/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ApiResponse<Bootcamp>> {
    Ok(to_response(bootcamp_service::get(&state, &id).await?))
}

/// POST /bootcamps
pub async fn create(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<Bootcamp>> {
    Ok(ApiResponse::created(bootcamp_service::create(&state, &caller, &payload).await?))
}

/// PUT /bootcamps/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<ApiResponse<Bootcamp>> {
    Ok(to_response(bootcamp_service::update(&state, &caller, &id, &payload).await?))
}

/// DELETE /bootcamps/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    bootcamp_service::delete(&state, &caller, &id).await?;
    Ok(ApiResponse::empty())
}

/// GET /bootcamps/radius/:zipcode/:distance
pub async fn within_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> ApiResult<ApiResponse<Vec<Value>>> {
    let page = bootcamp_service::within_radius(&state, &zipcode, &distance).await?;
    Ok(list_response(page))
}

/// PUT /bootcamps/:id/photo
pub async fn upload_photo(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<ApiResponse<String>> {
    let mut photo = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
        photo = Some(PhotoUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let name = upload::upload_photo(&state, &caller, &id, photo).await?;
    Ok(ApiResponse::success(name))
}
