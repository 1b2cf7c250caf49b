use tracing::info;
use uuid::Uuid;

use super::bootcamp_service;
use crate::database::models::Account;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ensure_owner;
use crate::state::AppState;

/// One file part taken from a multipart request
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// `photo_<bootcampId>.<ext>`: the extension comes from the original file
/// name, or from the content subtype when the name has none
pub fn photo_name(bootcamp_id: Uuid, upload: &PhotoUpload) -> Option<String> {
    let from_name = upload
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    let from_type = || {
        upload
            .content_type
            .as_deref()
            .and_then(|ct| ct.split_once('/'))
            .map(|(_, subtype)| subtype.split(['+', ';']).next().unwrap_or_default().trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    };

    from_name
        .or_else(from_type)
        .map(|ext| format!("photo_{}.{}", bootcamp_id, ext))
}

fn is_image(upload: &PhotoUpload) -> bool {
    upload
        .content_type
        .as_deref()
        .map_or(false, |ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
}

/// Stores the photo and only then points the bootcamp at it
pub async fn upload_photo(
    state: &AppState,
    caller: &Account,
    raw_id: &str,
    upload: Option<PhotoUpload>,
) -> ApiResult<String> {
    let bootcamp = bootcamp_service::get(state, raw_id).await?;
    ensure_owner(caller, bootcamp.user, "update this bootcamp")?;

    let upload = upload.ok_or_else(|| ApiError::bad_request("Please upload a file"))?;
    if !is_image(&upload) {
        return Err(ApiError::bad_request("Please upload an image file"));
    }
    let max_bytes = state.config.uploads.max_bytes;
    if upload.bytes.len() > max_bytes {
        return Err(ApiError::bad_request(format!(
            "Please upload an image less than {} bytes",
            max_bytes
        )));
    }
    let name = photo_name(bootcamp.id, &upload)
        .ok_or_else(|| ApiError::bad_request("Please upload an image file"))?;

    state.photos.save(&name, &upload.bytes).await?;
    bootcamp_service::set_photo(state, &bootcamp, name.clone()).await?;
    info!(bootcamp_id = %bootcamp.id, photo = %name, "updated bootcamp photo");
    Ok(name)
}
