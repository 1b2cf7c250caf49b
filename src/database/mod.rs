pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use repository::Repository;
pub use store::{Collection, Document, DocumentStore, StoreError};
