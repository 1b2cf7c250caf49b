//! Bulk import of fixture data and the matching wipe.
//!
//! Fixture ids may be any string (the sample data carries 24-hex ids from an
//! older store); each one is mapped to a stable UUID so references between
//! files keep pointing at the same records.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cli::utils::{connect_state, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::bootcamp::DEFAULT_PHOTO;
use crate::database::models::{merge_writable, slugify, Account, Bootcamp, Course, Review};
use crate::database::Collection;
use crate::filter::FilterExpr;
use crate::services::account_service::account_patch;
use crate::services::aggregates::{recompute_average_cost, recompute_average_rating};
use crate::services::{hash_new_password, str_field};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum SeedCommands {
    #[command(about = "Import users, bootcamps, courses and reviews from a fixture directory")]
    Import {
        #[arg(long, help = "Directory holding users/bootcamps/courses/reviews .json or .yaml files")]
        dir: Option<PathBuf>,
    },

    #[command(about = "Delete every document in every collection")]
    Destroy,
}

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
}

pub async fn handle(cmd: SeedCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = connect_state(config()).await?;
    match cmd {
        SeedCommands::Import { dir } => {
            let dir = dir.unwrap_or_else(default_seed_dir);
            let report = import(&state, &dir).await?;
            output_success(
                &output_format,
                &format!("Data imported from {}", dir.display()),
                Some(serde_json::to_value(&report)?),
            )
        }
        SeedCommands::Destroy => {
            let removed = destroy(&state).await?;
            output_success(&output_format, "Data destroyed", Some(json!({ "deleted": removed })))
        }
    }
}

fn default_seed_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("_data")
}

/// Stable UUID for a fixture id; real UUIDs pass through unchanged
pub fn seed_id(raw: &str) -> Uuid {
    if let Ok(id) = Uuid::parse_str(raw) {
        return id;
    }
    let digest = Sha256::digest(raw.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn record_id(record: &Value) -> Uuid {
    str_field(record, "_id")
        .or_else(|| str_field(record, "id"))
        .map(seed_id)
        .unwrap_or_else(Uuid::new_v4)
}

fn reference(record: &Value, field: &str) -> anyhow::Result<Uuid> {
    str_field(record, field)
        .map(seed_id)
        .with_context(|| format!("fixture record {} is missing `{}`", record_id(record), field))
}

/// Reads `<name>.json`, `<name>.yaml` or `<name>.yml`; a missing file is an empty set
pub fn load_records(dir: &Path, name: &str) -> anyhow::Result<Vec<Value>> {
    for ext in ["json", "yaml", "yml"] {
        let path = dir.join(format!("{}.{}", name, ext));
        if !path.exists() {
            continue;
        }
        let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let records: Vec<Value> = if ext == "json" {
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        } else {
            serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        };
        return Ok(records);
    }
    warn!(dir = %dir.display(), name, "no fixture file found");
    Ok(Vec::new())
}

fn created_at(record: &Value) -> Value {
    record
        .get("createdAt")
        .cloned()
        .unwrap_or_else(|| json!(Utc::now()))
}

async fn seed_account(state: &AppState, record: &Value) -> anyhow::Result<Account> {
    let plaintext = str_field(record, "password").unwrap_or_default();
    let hash = hash_new_password(plaintext, state.config.session.bcrypt_cost, "password").await?;
    let base = json!({
        "id": record_id(record),
        "createdAt": created_at(record),
        "password": hash,
    });
    let patch = account_patch(record, &["name", "email", "role"]);
    Ok(merge_writable(base, &patch)?)
}

async fn seed_bootcamp(state: &AppState, record: &Value) -> anyhow::Result<Bootcamp> {
    let mut base = Map::new();
    base.insert("id".into(), json!(record_id(record)));
    base.insert("createdAt".into(), created_at(record));
    base.insert("user".into(), json!(reference(record, "user")?));
    base.insert(
        "photo".into(),
        record.get("photo").cloned().unwrap_or_else(|| json!(DEFAULT_PHOTO)),
    );
    if let Some(location) = record.get("location") {
        base.insert("location".into(), location.clone());
    }

    let mut bootcamp: Bootcamp = merge_writable(Value::Object(base), record)?;
    bootcamp.slug = slugify(&bootcamp.name);

    if bootcamp.location.is_none() {
        let address = str_field(record, "address")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .with_context(|| format!("bootcamp {} has neither location nor address", bootcamp.name))?;
        let point = state
            .geocoder
            .geocode(address)
            .await?
            .with_context(|| format!("could not geocode address {}", address))?;
        bootcamp.location = Some(point.into_location());
    }
    Ok(bootcamp)
}

fn child_base(record: &Value) -> anyhow::Result<Value> {
    Ok(json!({
        "id": record_id(record),
        "createdAt": created_at(record),
        "bootcamp": reference(record, "bootcamp")?,
        "user": reference(record, "user")?,
    }))
}

/// Inserts every fixture, then recomputes the aggregates of each touched bootcamp
pub async fn import(state: &AppState, dir: &Path) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for record in load_records(dir, "users")? {
        let account = seed_account(state, &record).await?;
        state.accounts().insert(&account).await?;
        report.users += 1;
    }

    for record in load_records(dir, "bootcamps")? {
        let bootcamp = seed_bootcamp(state, &record).await?;
        state.bootcamps().insert(&bootcamp).await?;
        report.bootcamps += 1;
    }

    let mut touched = BTreeSet::new();
    for record in load_records(dir, "courses")? {
        let course: Course = merge_writable(child_base(&record)?, &record)?;
        state.courses().insert(&course).await?;
        touched.insert(course.bootcamp);
        report.courses += 1;
    }

    for record in load_records(dir, "reviews")? {
        let review: Review = merge_writable(child_base(&record)?, &record)?;
        state.reviews().insert(&review).await?;
        touched.insert(review.bootcamp);
        report.reviews += 1;
    }

    for bootcamp_id in touched {
        recompute_average_cost(state, bootcamp_id).await?;
        recompute_average_rating(state, bootcamp_id).await?;
    }

    info!(?report, dir = %dir.display(), "seed import finished");
    Ok(report)
}

/// Removes all documents; returns how many went
pub async fn destroy(state: &AppState) -> anyhow::Result<u64> {
    let everything = FilterExpr::all();
    let mut removed = 0;
    for collection in [
        Collection::Reviews,
        Collection::Courses,
        Collection::Bootcamps,
        Collection::Accounts,
    ] {
        let count = state.store.delete_many(collection, &everything).await?;
        info!(%collection, count, "destroyed documents");
        removed += count;
    }
    Ok(removed)
}
