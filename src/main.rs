use std::sync::Arc;

use devcamp_api::config::config;
use devcamp_api::database::{DatabaseManager, PgDocumentStore};
use devcamp_api::outbound::{geocoder_from_config, LocalPhotoStore, LogMailer};
use devcamp_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devcamp_api=info,tower_http=info")),
        )
        .init();

    let config = config().clone();
    tracing::info!("Starting DevCamper API in {:?} mode", config.environment);

    if config.session.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;

    let store = Arc::new(PgDocumentStore::new(pool));
    let geocoder = geocoder_from_config(&config.geocoder)?;
    let mailer = Arc::new(LogMailer::new(&config.mail));
    let photos = Arc::new(LocalPhotoStore::new(config.uploads.directory.clone()));

    let port = config.server.port;
    let state = AppState::new(config, store, geocoder, mailer, photos);
    let app = devcamp_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("DevCamper API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
