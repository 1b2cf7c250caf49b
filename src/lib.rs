pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod outbound;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::state::AppState;

/// Headroom over the photo size limit for multipart framing
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);
    let upload_limit = state.config.uploads.max_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health::health))
        .merge(account_routes())
        .merge(user_routes())
        .merge(bootcamp_routes(upload_limit))
        .merge(course_routes())
        .merge(review_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn account_routes() -> Router<AppState> {
    use handlers::accounts;

    Router::new()
        .route("/accounts/register", post(accounts::register))
        .route("/accounts/login", post(accounts::login))
        .route("/accounts/me", get(accounts::me))
        .route("/accounts/me/details", put(accounts::update_details))
        .route("/accounts/me/password", put(accounts::update_password))
        .route("/accounts/password/forgot", post(accounts::forgot_password))
        .route("/accounts/password/reset/:token", put(accounts::reset_password))
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/accounts/users", get(users::list).post(users::create))
        .route(
            "/accounts/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
}

fn bootcamp_routes(upload_limit: usize) -> Router<AppState> {
    use handlers::{bootcamps, courses, reviews};

    Router::new()
        .route("/bootcamps", get(bootcamps::list).post(bootcamps::create))
        .route(
            "/bootcamps/:id",
            get(bootcamps::get).put(bootcamps::update).delete(bootcamps::delete),
        )
        .route("/bootcamps/radius/:zipcode/:distance", get(bootcamps::within_radius))
        .route(
            "/bootcamps/:id/photo",
            put(bootcamps::upload_photo).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Nested child collections
        .route(
            "/bootcamps/:id/courses",
            get(courses::list_for_bootcamp).post(courses::create),
        )
        .route(
            "/bootcamps/:id/reviews",
            get(reviews::list_for_bootcamp).post(reviews::create),
        )
}

fn course_routes() -> Router<AppState> {
    use handlers::courses;

    Router::new()
        .route("/courses", get(courses::list))
        .route(
            "/courses/:id",
            get(courses::get).put(courses::update).delete(courses::delete),
        )
}

fn review_routes() -> Router<AppState> {
    use handlers::reviews;

    Router::new()
        .route("/reviews", get(reviews::list))
        .route(
            "/reviews/:id",
            get(reviews::get).put(reviews::update).delete(reviews::delete),
        )
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "DevCamper API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": ["/health"],
                "accounts": ["/accounts/register", "/accounts/login", "/accounts/me", "/accounts/users"],
                "bootcamps": ["/bootcamps", "/bootcamps/:id", "/bootcamps/radius/:zipcode/:distance", "/bootcamps/:id/photo"],
                "courses": ["/courses", "/courses/:id", "/bootcamps/:id/courses"],
                "reviews": ["/reviews", "/reviews/:id", "/bootcamps/:id/reviews"]
            }
        }
    }))
}
