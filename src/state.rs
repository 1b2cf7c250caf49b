use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::models::{Account, Bootcamp, Course, Review};
use crate::database::{DocumentStore, Repository};
use crate::outbound::{Geocoder, Mailer, PhotoStore};

/// Shared, immutable application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub mailer: Arc<dyn Mailer>,
    pub photos: Arc<dyn PhotoStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        geocoder: Arc<dyn Geocoder>,
        mailer: Arc<dyn Mailer>,
        photos: Arc<dyn PhotoStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            geocoder,
            mailer,
            photos,
        }
    }

    pub fn accounts(&self) -> Repository<Account> {
        Repository::new(self.store.clone())
    }

    pub fn bootcamps(&self) -> Repository<Bootcamp> {
        Repository::new(self.store.clone())
    }

    pub fn courses(&self) -> Repository<Course> {
        Repository::new(self.store.clone())
    }

    pub fn reviews(&self) -> Repository<Review> {
        Repository::new(self.store.clone())
    }
}
