use std::sync::Arc;

use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgDocumentStore};
use crate::outbound::{geocoder_from_config, LocalPhotoStore, LogMailer};
use crate::state::AppState;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": message
                }))?
            );
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Connects to the configured database and assembles the same state the server runs with
pub async fn connect_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;

    Ok(AppState::new(
        config.clone(),
        Arc::new(PgDocumentStore::new(pool)),
        geocoder_from_config(&config.geocoder)?,
        Arc::new(LogMailer::new(&config.mail)),
        Arc::new(LocalPhotoStore::new(config.uploads.directory.clone())),
    ))
}
