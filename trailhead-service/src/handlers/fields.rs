//! Explicit field allow-listing
//!
//! Where the original design filtered arbitrary body fields dynamically,
//! this service uses a fixed permitted set: callers name the fields a
//! request may touch and everything else is dropped.

use crate::store::Document;

/// Return only the key/value pairs whose keys appear in `allowed`.
#[must_use]
pub fn allow_fields(doc: &Document, allowed: &[&str]) -> Document {
    doc.iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_allow_fields_keeps_intersection() {
        let doc: Document = json!({
            "name": "Alice",
            "email": "alice@example.com",
            "role": "admin",
            "password": "nope"
        })
        .as_object()
        .unwrap()
        .clone();

        let filtered = allow_fields(&doc, &["name", "email"]);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered["name"], json!("Alice"));
        assert_eq!(filtered["email"], json!("alice@example.com"));
        assert!(!filtered.contains_key("role"));
        assert!(!filtered.contains_key("password"));
    }

    #[test]
    fn test_allow_fields_empty_input() {
        let doc = Document::new();
        assert!(allow_fields(&doc, &["name"]).is_empty());
    }
}
