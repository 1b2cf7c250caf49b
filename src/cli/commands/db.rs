use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create collection tables and indexes")]
    Migrate {
        #[arg(long, help = "Print the statements instead of running them")]
        dry_run: bool,
    },

    #[command(about = "Check database connectivity")]
    Status,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Migrate { dry_run } => handle_migrate(dry_run, output_format).await,
        DbCommands::Status => handle_status(output_format).await,
    }
}

async fn handle_migrate(dry_run: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    let statements = DatabaseManager::migration_statements();
    if dry_run {
        match output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "statements": statements }))?),
            OutputFormat::Text => {
                for statement in &statements {
                    println!("{};", statement);
                }
            }
        }
        return Ok(());
    }

    let pool = DatabaseManager::connect(&config().database).await?;
    DatabaseManager::migrate(&pool).await?;
    output_success(
        &output_format,
        "Database migrated",
        Some(json!({ "statements": statements.len() })),
    )
}

async fn handle_status(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config().database).await?;
    match DatabaseManager::health_check(&pool).await {
        Ok(()) => output_success(&output_format, "Database reachable", None),
        Err(e) => {
            output_error(&output_format, &e.to_string())?;
            Err(e.into())
        }
    }
}
