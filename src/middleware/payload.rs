use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;

/// JSON request body whose rejections use the API error envelope
#[derive(Debug, Clone)]
pub struct JsonPayload(pub Value);

#[axum::async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(JsonPayload(value))
    }
}
