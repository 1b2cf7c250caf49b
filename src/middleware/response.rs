use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::filter::Pagination;

/// Wrapper for API responses that adds the `{ success: true, ... }` envelope.
/// `count`, `pagination` and `token` appear only when set.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub count: Option<u64>,
    pub pagination: Option<Pagination>,
    pub token: Option<String>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            count: None,
            pagination: None,
            token: None,
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::success(data).with_status(StatusCode::CREATED)
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<Value> {
    /// `{ success: true, token }` returned by every credential-issuing route
    pub fn token(token: String) -> Self {
        Self {
            data: None,
            count: None,
            pagination: None,
            token: Some(token),
            status_code: None,
        }
    }

    /// `{ success: true, data: {} }` returned after deletes
    pub fn empty() -> Self {
        Self::success(json!({}))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));
        if let Some(count) = self.count {
            envelope.insert("count".to_string(), json!(count));
        }
        if let Some(pagination) = &self.pagination {
            envelope.insert("pagination".to_string(), json!(pagination));
        }
        if let Some(token) = self.token {
            envelope.insert("token".to_string(), Value::String(token));
        }
        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(value) => {
                    envelope.insert("data".to_string(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "error": "Failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (status, Json(Value::Object(envelope))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PageLink;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn list_envelope_carries_count_and_pagination() {
        let pagination = Pagination {
            next: Some(PageLink { page: 3, limit: 10 }),
            prev: Some(PageLink { page: 1, limit: 10 }),
        };
        let response = ApiResponse::success(vec![json!({"id": 1})])
            .with_count(1)
            .with_pagination(pagination)
            .into_response();
        let (status, body) = body_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "count": 1,
                "pagination": {"next": {"page": 3, "limit": 10}, "prev": {"page": 1, "limit": 10}},
                "data": [{"id": 1}]
            })
        );
    }

    #[tokio::test]
    async fn token_and_created_envelopes() {
        let (_, body) = body_of(ApiResponse::token("abc".into()).into_response()).await;
        assert_eq!(body, json!({"success": true, "token": "abc"}));

        let (status, body) = body_of(ApiResponse::created(json!({"name": "x"})).into_response()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["name"], json!("x"));

        let (_, body) = body_of(ApiResponse::empty().into_response()).await;
        assert_eq!(body, json!({"success": true, "data": {}}));
    }
}
