use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::verify_session_token;
use crate::database::models::{Account, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// The account behind a verified `Authorization: Bearer <token>` header.
/// Handlers that take this extractor are protected routes.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_from_headers(&parts.headers).map_err(|msg| {
            warn!("Rejected request to {}: {}", parts.uri.path(), msg);
            ApiError::not_authorized()
        })?;

        let account_id = verify_session_token(&token, &state.config.session)?;
        let account = state.accounts().select_id(account_id).await?.ok_or_else(|| {
            warn!("Session token for unknown account {}", account_id);
            ApiError::not_authorized()
        })?;

        Ok(CurrentAccount(account))
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

/// Role gate applied after authentication
pub fn authorize(account: &Account, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&account.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "User role {} is not authorized to access this route",
            account.role
        )))
    }
}

/// Ownership gate: the owner and admins pass
pub fn ensure_owner(account: &Account, owner: Uuid, action: &str) -> Result<(), ApiError> {
    if account.is_admin() || account.id == owner {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "User {} is not authorized to {}",
            account.id, action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn account(role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            role,
            password: "hash".into(),
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn role_gate() {
        let user = account(Role::User);
        let err = authorize(&user, &[Role::Publisher, Role::Admin]).unwrap_err();
        assert_eq!(err.message(), "User role user is not authorized to access this route");
        assert!(authorize(&account(Role::Admin), &[Role::Publisher, Role::Admin]).is_ok());
    }

    #[test]
    fn ownership_gate() {
        let owner = account(Role::Publisher);
        let other = account(Role::Publisher);
        let admin = account(Role::Admin);
        assert!(ensure_owner(&owner, owner.id, "update this bootcamp").is_ok());
        assert!(ensure_owner(&admin, owner.id, "update this bootcamp").is_ok());
        assert!(matches!(
            ensure_owner(&other, owner.id, "update this bootcamp"),
            Err(ApiError::Forbidden(_))
        ));
    }
}
