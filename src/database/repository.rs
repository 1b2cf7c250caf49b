use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::database::models::Entity;
use crate::database::store::{DocumentStore, StoreError};
use crate::filter::{FilterExpr, FindOptions};

/// Typed access to one collection of a `DocumentStore`
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub async fn select_id(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(T::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn select_any(&self, filter: &FilterExpr, options: &FindOptions) -> Result<Vec<T>, StoreError> {
        let docs = self.store.find(T::COLLECTION, filter, options).await?;
        docs.into_iter()
            .map(|doc| T::from_document(doc).map_err(StoreError::from))
            .collect()
    }

    pub async fn select_one(&self, filter: &FilterExpr) -> Result<Option<T>, StoreError> {
        let options = FindOptions {
            limit: Some(1),
            ..Default::default()
        };
        Ok(self.select_any(filter, &options).await?.into_iter().next())
    }

    pub async fn count(&self, filter: &FilterExpr) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }

    pub async fn insert(&self, entity: &T) -> Result<(), StoreError> {
        self.store.insert(T::COLLECTION, entity.to_document()?).await
    }

    /// Writes the entity back; false when it no longer exists
    pub async fn update(&self, entity: &T) -> Result<bool, StoreError> {
        self.store.replace(T::COLLECTION, entity.to_document()?).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn delete_any(&self, filter: &FilterExpr) -> Result<u64, StoreError> {
        self.store.delete_many(T::COLLECTION, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::Review;
    use chrono::Utc;

    #[tokio::test]
    async fn typed_round_trip_through_store() {
        let repo: Repository<Review> = Repository::new(Arc::new(MemoryStore::new()));
        let bootcamp = Uuid::new_v4();
        let review = Review {
            id: Uuid::new_v4(),
            title: "Solid".into(),
            text: "Good mentors".into(),
            rating: 7,
            bootcamp,
            user: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        repo.insert(&review).await.unwrap();

        let by_parent = FilterExpr::eq("bootcamp", bootcamp.to_string()).unwrap();
        let found = repo.select_one(&by_parent).await.unwrap().unwrap();
        assert_eq!(found.id, review.id);
        assert_eq!(repo.count(&by_parent).await.unwrap(), 1);

        assert!(repo.delete(review.id).await.unwrap());
        assert!(repo.select_id(review.id).await.unwrap().is_none());
    }
}
