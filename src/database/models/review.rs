use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidationErrors;
use super::Entity;
use crate::database::store::Collection;

/// A rating of one bootcamp by one account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub rating: u8,
    pub bootcamp: Uuid,
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    const COLLECTION: Collection = Collection::Reviews;
    const WRITABLE: &'static [&'static str] = &["title", "text", "rating"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Please add a title for the review");
        errors.max_len("title", &self.title, 100, "Title can not be more than 100 characters");
        errors.require("text", &self.text, "Please add some text");
        if !(1..=10).contains(&self.rating) {
            errors.add("rating", "Please add a rating between 1 and 10");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_in_range() {
        let mut review = Review {
            id: Uuid::new_v4(),
            title: "Learned a ton".into(),
            text: "Great instructors".into(),
            rating: 8,
            bootcamp: Uuid::new_v4(),
            user: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        assert!(review.validate().is_ok());
        review.rating = 0;
        assert!(review.validate().is_err());
        review.rating = 11;
        assert!(review.validate().is_err());
    }
}
