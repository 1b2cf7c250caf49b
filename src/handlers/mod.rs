// handlers/mod.rs - HTTP handlers, one module per resource
//
// Handlers stay thin: extract, call the service, wrap the result in the
// response envelope. Routes that take `CurrentAccount` are protected.
pub mod accounts;
pub mod bootcamps;
pub mod courses;
pub mod health;
pub mod reviews;
pub mod users;

use serde::Serialize;
use serde_json::Value;

use crate::middleware::ApiResponse;
use crate::services::ListPage;

/// Query string as ordered key/value pairs; repeated keys are kept
pub fn query_pairs(raw: Option<String>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

pub fn list_response(page: ListPage) -> ApiResponse<Vec<Value>> {
    let mut response = ApiResponse::success(page.data).with_count(page.count);
    if let Some(pagination) = page.pagination {
        response = response.with_pagination(pagination);
    }
    response
}

pub fn to_response<T: Serialize>(entity: T) -> ApiResponse<T> {
    ApiResponse::success(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_decode_and_keep_repeats() {
        let pairs = query_pairs(Some("careers%5Bin%5D=UI%2FUX&careers%5Bin%5D=Business&location.state=MA".into()));
        assert_eq!(
            pairs,
            vec![
                ("careers[in]".to_string(), "UI/UX".to_string()),
                ("careers[in]".to_string(), "Business".to_string()),
                ("location.state".to_string(), "MA".to_string()),
            ]
        );
        assert!(query_pairs(None).is_empty());
    }
}
