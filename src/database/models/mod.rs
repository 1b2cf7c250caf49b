pub mod account;
pub mod bootcamp;
pub mod course;
pub mod review;
pub mod validation;

pub use account::{Account, AccountProfile, Role};
pub use bootcamp::{Bootcamp, Career, Location};
pub use course::{Course, Skill};
pub use review::Review;
pub use validation::{FieldError, ValidationErrors};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::store::{Collection, Document};

/// A typed record stored as a JSON document in one collection
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Sized {
    const COLLECTION: Collection;

    /// Fields a caller may set through a create or update payload. Anything
    /// else in the payload (owner, derived aggregates, slug) is ignored.
    const WRITABLE: &'static [&'static str];

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn validate(&self) -> Result<(), ValidationErrors>;

    fn to_document(&self) -> Result<Document, serde_json::Error> {
        Ok(Document {
            id: self.id(),
            created_at: self.created_at(),
            body: serde_json::to_value(self)?,
        })
    }

    fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.body)
    }
}

/// Copies the writable fields of `payload` onto `base`, decodes the result
/// and validates it. Create starts from a skeleton document, update from the
/// stored one, so both paths share the same rules.
pub fn merge_writable<T: Entity>(base: Value, payload: &Value) -> Result<T, ValidationErrors> {
    let mut merged: Map<String, Value> = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let patch = payload
        .as_object()
        .ok_or_else(|| ValidationErrors::single("body", "Request body must be a JSON object"))?;

    for field in T::WRITABLE {
        if let Some(value) = patch.get(*field) {
            merged.insert(field.to_string(), value.clone());
        }
    }

    let entity: T = serde_json::from_value(Value::Object(merged))
        .map_err(|e| ValidationErrors::single("body", format!("Invalid value: {}", e)))?;
    entity.validate()?;
    Ok(entity)
}

/// Lower-case, hyphen-separated URL fragment: "Devworks Bootcamp!" → "devworks-bootcamp"
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug
}
