use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{is_valid_email, ValidationErrors};
use super::Entity;
use crate::database::store::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Publisher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account. `password` holds the bcrypt hash, never plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// What callers get to see of an account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn clear_reset(&mut self) {
        self.reset_password_token = None;
        self.reset_password_expire = None;
    }
}

impl Entity for Account {
    const COLLECTION: Collection = Collection::Accounts;
    const WRITABLE: &'static [&'static str] = &["name", "email", "role"];

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
        if self.email.trim().is_empty() {
            errors.add("email", "Please add an email");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Please add a valid email");
        }
        errors.require("password", &self.password, "Please add a password");
        errors.into_result()
    }
}

/// Case-insensitive uniqueness is enforced on the stored form
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "John Doe".into(),
            email: "john@gmail.com".into(),
            role: Role::Publisher,
            password: "$2b$04$hash".into(),
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn profile_omits_credentials() {
        let value = serde_json::to_value(account().profile()).unwrap();
        assert_eq!(value["role"], json!("publisher"));
        assert!(value.get("password").is_none());
        assert!(value.get("resetPasswordToken").is_none());
    }

    #[test]
    fn stored_form_keeps_hash_and_omits_empty_reset_fields() {
        let value = serde_json::to_value(account()).unwrap();
        assert_eq!(value["password"], json!("$2b$04$hash"));
        assert!(value.get("resetPasswordExpire").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn validation_reports_each_field() {
        let mut invalid = account();
        invalid.name = String::new();
        invalid.email = "nope".into();
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.to_string(), "Please add a name, Please add a valid email");
    }

    #[test]
    fn normalizes_email_case() {
        assert_eq!(normalize_email("  John@Gmail.COM "), "john@gmail.com");
    }
}
