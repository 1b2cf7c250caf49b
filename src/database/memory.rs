use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::{Collection, Document, DocumentStore, StoreError};
use crate::filter::filter_match::matches;
use crate::filter::filter_order::FilterOrder;
use crate::filter::{FilterExpr, FindOptions};

/// In-process document store with the same filter, sort and uniqueness
/// semantics as `PgDocumentStore`. Used by the test suites and for running
/// the API without a database.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn unique_violation(collection: Collection, existing: &[Document], candidate: &Document) -> Option<String> {
        for key in collection.unique_keys() {
            let candidate_values = unique_values(key, &candidate.body);
            if candidate_values.iter().any(Option::is_none) {
                continue;
            }
            let clash = existing
                .iter()
                .filter(|doc| doc.id != candidate.id)
                .any(|doc| unique_values(key, &doc.body) == candidate_values);
            if clash {
                return Some(format!("{}_{}_key", collection.table_name(), key.join("_")));
            }
        }
        None
    }
}

fn unique_values(key: &[&str], body: &Value) -> Vec<Option<String>> {
    key.iter()
        .map(|field| match body.get(*field) {
            Some(Value::String(s)) => Some(s.to_lowercase()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| d.id == doc.id) {
            return Err(StoreError::Duplicate(format!("{}_pkey", collection.table_name())));
        }
        if let Some(constraint) = Self::unique_violation(collection, docs, &doc) {
            return Err(StoreError::Duplicate(constraint));
        }
        docs.push(doc);
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &FilterExpr,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        filter.validate()?;
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| matches(filter, &d.body)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        if !options.sort.is_empty() {
            found.sort_by(|a, b| FilterOrder::compare(&options.sort, &a.body, &b.body).then_with(|| a.id.cmp(&b.id)));
        }
        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, collection: Collection, filter: &FilterExpr) -> Result<u64, StoreError> {
        filter.validate()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| matches(filter, &d.body)).count() as u64)
            .unwrap_or(0))
    }

    async fn replace(&self, collection: Collection, doc: Document) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if let Some(constraint) = Self::unique_violation(collection, docs, &doc) {
            return Err(StoreError::Duplicate(constraint));
        }
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => {
                existing.body = doc.body;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() < before)
    }

    async fn delete_many(&self, collection: Collection, filter: &FilterExpr) -> Result<u64, StoreError> {
        filter.validate()?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| !matches(filter, &d.body));
        Ok((before - docs.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
