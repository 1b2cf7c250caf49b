use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::filter::{FilterError, FilterExpr, FindOptions};

/// Document collections, one table per collection in Postgres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Accounts,
    Bootcamps,
    Courses,
    Reviews,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Accounts,
        Collection::Bootcamps,
        Collection::Courses,
        Collection::Reviews,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Bootcamps => "bootcamps",
            Collection::Courses => "courses",
            Collection::Reviews => "reviews",
        }
    }

    /// Field sets that must be unique across the collection. Each inner
    /// slice is one constraint (composite when it names several fields).
    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Collection::Accounts => &[&["email"]],
            Collection::Bootcamps => &[&["name"]],
            Collection::Courses => &[],
            Collection::Reviews => &[&["bootcamp", "user"]],
        }
    }

    /// Stored fields never returned to API callers
    pub fn hidden_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Accounts => &["password", "resetPasswordToken", "resetPasswordExpire"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A stored document. `body` is the full JSON object, including `id` and
/// `createdAt`, which are mirrored into their own columns for indexing and
/// sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub body: Value,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => StoreError::Duplicate(db.constraint().unwrap_or("unique key").to_string()),
                Some("22P02") | Some("22003") | Some("22023") => StoreError::InvalidValue(db.message().to_string()),
                _ => StoreError::Sqlx(err),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Sqlx(err),
        }
    }
}

/// Persistence boundary. Implementations own every record; callers pass
/// ids and filters and receive owned documents back.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &FilterExpr,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: Collection, filter: &FilterExpr) -> Result<u64, StoreError>;

    /// Replaces the body of an existing document; false when absent
    async fn replace(&self, collection: Collection, doc: Document) -> Result<bool, StoreError>;

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_many(&self, collection: Collection, filter: &FilterExpr) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
