// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::models::ValidationErrors;
use crate::database::StoreError;
use crate::filter::FilterError;
use crate::outbound::{GeocodeError, MailError, PhotoStoreError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError(ValidationErrors),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationError(errors) => errors.to_string(),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// "Resource not found with id of X"
    pub fn resource_not_found(what: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{} not found with id of {}", what, id))
    }

    pub fn not_authorized() -> Self {
        ApiError::Unauthorized("Not authorized to access this route".to_string())
    }
}

// Convert other error types to ApiError
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(constraint) => {
                tracing::debug!("Duplicate key on {}", constraint);
                ApiError::conflict("Duplicate field value entered")
            }
            StoreError::InvalidValue(msg) => {
                tracing::debug!("Rejected value: {}", msg);
                ApiError::bad_request("Invalid value")
            }
            StoreError::Filter(e) => e.into(),
            StoreError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            StoreError::Serialization(e) => {
                tracing::error!("Stored document could not be decoded: {}", e);
                ApiError::internal_server_error("Server Error")
            }
            StoreError::Sqlx(e) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Server Error")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(msg) => {
                tracing::warn!("Rejected session token: {}", msg);
                ApiError::not_authorized()
            }
            other => {
                tracing::error!("Credential service error: {}", other);
                ApiError::internal_server_error("Server Error")
            }
        }
    }
}

impl From<GeocodeError> for ApiError {
    fn from(err: GeocodeError) -> Self {
        tracing::error!("Geocoding failed: {}", err);
        match err {
            GeocodeError::MissingConfig(_) => ApiError::service_unavailable("Geocoding is not configured"),
            _ => ApiError::bad_gateway("Geocoding service unavailable"),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        tracing::error!("{}", err);
        ApiError::internal_server_error("Email could not be sent")
    }
}

impl From<PhotoStoreError> for ApiError {
    fn from(err: PhotoStoreError) -> Self {
        tracing::error!("Photo write failed: {}", err);
        ApiError::internal_server_error("Problem with file upload")
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {}", err);
        ApiError::internal_server_error("Failed to format response")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
