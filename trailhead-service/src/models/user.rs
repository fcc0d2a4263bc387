//! User model: payloads, constraints, and descriptor
//!
//! Accounts are created through the signup flow (`auth::handlers`), which
//! owns password hashing; the generic create operation is deliberately
//! disabled for this collection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::handlers::{Payload, Resource};
use crate::store::{Document, Filter, FilterCondition};

use super::Violations;

/// Store collection holding user accounts.
pub const COLLECTION: &str = "users";

/// Assignable roles.
pub const ROLES: [&str; 4] = ["user", "guide", "lead-guide", "admin"];

/// Roles a caller may pick for themselves at signup.
pub const SELF_ASSIGNABLE_ROLES: [&str; 2] = ["user", "guide"];

/// Fields that never leave the server.
pub const PRIVATE_FIELDS: [&str; 4] = [
    "password",
    "password_reset_token",
    "password_reset_expires",
    "active",
];

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Loose email shape check.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whether the account is active. Missing means active.
#[must_use]
pub fn is_active(doc: &Document) -> bool {
    doc.get("active").and_then(Value::as_bool).unwrap_or(true)
}

/// Whether the password changed after a token was issued at `iat`.
#[must_use]
pub fn changed_password_after(doc: &Document, iat: i64) -> bool {
    doc.get("password_changed_at")
        .and_then(Value::as_str)
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .map(|changed| iat < changed.timestamp())
        .unwrap_or(false)
}

/// Remove fields that never leave the server from a user document.
#[must_use]
pub fn sanitize(mut doc: Document) -> Document {
    for field in PRIVATE_FIELDS {
        doc.remove(field);
    }
    doc
}

/// Placeholder create payload: user accounts go through `/signup`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUser {}

impl Payload for CreateUser {
    fn into_document(self) -> Result<Document> {
        Err(AppError::BadRequest(
            "This route is not defined, please use /signup instead".to_string(),
        ))
    }
}

/// Payload for administrative user updates. Passwords are never updated
/// through this route.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub role: Option<String>,
}

impl Payload for UpdateUser {
    fn into_document(self) -> Result<Document> {
        let mut violations = Violations::new();
        let mut doc = Document::new();

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                violations.add("name", "Please tell us your name");
            }
            doc.insert("name".into(), json!(name));
        }
        if let Some(email) = self.email {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                violations.add("email", "Please provide a valid email");
            }
            doc.insert("email".into(), json!(email));
        }
        if let Some(photo) = self.photo {
            doc.insert("photo".into(), json!(photo));
        }
        if let Some(role) = self.role {
            if !ROLES.contains(&role.as_str()) {
                violations.add("role", "Role is either: user, guide, lead-guide, admin");
            }
            doc.insert("role".into(), json!(role));
        }

        violations.finish(doc)
    }
}

/// Descriptor for the users collection.
pub struct User;

impl Resource for User {
    const COLLECTION: &'static str = COLLECTION;
    const ENTITY: &'static str = "User";
    type Create = CreateUser;
    type Update = UpdateUser;

    fn unique_keys() -> &'static [&'static [&'static str]] {
        &[&["email"]]
    }

    fn scope_filter() -> Filter {
        // deactivated accounts are invisible to reads
        Filter::new().and(FilterCondition::ne("active", false))
    }

    fn private_fields() -> &'static [&'static str] {
        &PRIVATE_FIELDS
    }
}
