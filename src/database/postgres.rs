use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::database::query_builder::QueryBuilder;
use crate::database::store::{Collection, Document, DocumentStore, StoreError};
use crate::filter::{FilterExpr, FindOptions};

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    doc: Json<Value>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            created_at: row.created_at,
            body: row.doc.0,
        }
    }
}

/// Document store over Postgres: one `(id, created_at, doc jsonb)` table per
/// collection, created by `DatabaseManager::migrate`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn bind_params<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    params: &[Value],
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    for p in params {
        q = q.bind(Json(p.clone()));
    }
    q
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError> {
        sqlx::query(&QueryBuilder::new(collection).insert())
            .bind(doc.id)
            .bind(doc.created_at)
            .bind(Json(doc.body))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&QueryBuilder::new(collection).get())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &FilterExpr,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let sql = QueryBuilder::new(collection).select(filter, options)?;
        tracing::debug!(collection = %collection, query = %sql.query, "find");
        let mut q = sqlx::query_as::<_, DocumentRow>(&sql.query);
        for p in &sql.params {
            q = q.bind(Json(p.clone()));
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn count(&self, collection: Collection, filter: &FilterExpr) -> Result<u64, StoreError> {
        let sql = QueryBuilder::new(collection).count(filter)?;
        let row = bind_params(sqlx::query(&sql.query), &sql.params)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn replace(&self, collection: Collection, doc: Document) -> Result<bool, StoreError> {
        let result = sqlx::query(&QueryBuilder::new(collection).replace())
            .bind(doc.id)
            .bind(Json(doc.body))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(&QueryBuilder::new(collection).delete_by_id())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, collection: Collection, filter: &FilterExpr) -> Result<u64, StoreError> {
        let sql = QueryBuilder::new(collection).delete(filter)?;
        let result = bind_params(sqlx::query(&sql.query), &sql.params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
