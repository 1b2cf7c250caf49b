use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{is_valid_email, is_valid_http_url, ValidationErrors};
use super::Entity;
use crate::database::store::Collection;

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Career {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Mobile Development")]
    MobileDevelopment,
    #[serde(rename = "UI/UX")]
    UiUx,
    #[serde(rename = "Data Science")]
    DataScience,
    Business,
    Other,
}

/// GeoJSON point plus the address parts the geocoder resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lng, lat]`
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub country: String,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: Uuid,
    /// Owning account
    pub user: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub careers: Vec<Career>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Bootcamp {
    const COLLECTION: Collection = Collection::Bootcamps;
    const WRITABLE: &'static [&'static str] = &[
        "name",
        "description",
        "website",
        "phone",
        "email",
        "careers",
        "housing",
        "jobAssistance",
        "jobGuarantee",
        "acceptGi",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Please add a name");
        errors.max_len("name", &self.name, 50, "Name can not be more than 50 characters");
        errors.require("description", &self.description, "Please add a description");
        errors.max_len(
            "description",
            &self.description,
            500,
            "Description can not be more than 500 characters",
        );
        if let Some(website) = &self.website {
            if !is_valid_http_url(website) {
                errors.add("website", "Please use a valid URL with HTTP or HTTPS");
            }
        }
        if let Some(phone) = &self.phone {
            errors.max_len("phone", phone, 20, "Phone number can not be longer than 20 characters");
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                errors.add("email", "Please add a valid email");
            }
        }
        if self.careers.is_empty() {
            errors.add("careers", "Please add at least one career");
        }
        errors.into_result()
    }
}
