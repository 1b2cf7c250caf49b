use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidationErrors;
use super::Entity;
use crate::database::store::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weeks: u32,
    #[serde(default)]
    pub tuition: f64,
    pub minimum_skill: Option<Skill>,
    #[serde(default)]
    pub scholarship_available: bool,
    pub bootcamp: Uuid,
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Entity for Course {
    const COLLECTION: Collection = Collection::Courses;
    const WRITABLE: &'static [&'static str] = &[
        "title",
        "description",
        "weeks",
        "tuition",
        "minimumSkill",
        "scholarshipAvailable",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Please add a course title");
        errors.require("description", &self.description, "Please add a description");
        if self.weeks == 0 {
            errors.add("weeks", "Please add number of weeks");
        }
        if !self.tuition.is_finite() || self.tuition < 0.0 {
            errors.add("tuition", "Please add a tuition cost");
        }
        if self.minimum_skill.is_none() {
            errors.add("minimumSkill", "Please add a minimum skill");
        }
        errors.into_result()
    }
}
