//! Review model: payloads, constraints, and descriptor
//!
//! A review belongs to a tour and a user; one review per user per tour.
//! After any review write the owning tour's aggregates are recomputed by
//! `services::ratings`, invoked explicitly by the review routes.

use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::handlers::{Payload, PopulateKind, PopulateSpec, Resource};
use crate::store::Document;

use super::{user, Violations};

/// Store collection holding reviews.
pub const COLLECTION: &str = "reviews";

static POPULATE_USER: [PopulateSpec; 1] = [PopulateSpec {
    field: "user",
    collection: user::COLLECTION,
    select: &["name", "photo"],
    kind: PopulateKind::Ref,
}];

fn check_rating(violations: &mut Violations, rating: f64) {
    if !(1.0..=5.0).contains(&rating) {
        violations.add("rating", "Rating must be between 1 and 5");
    }
}

/// Payload for creating a review. The nested route fills `tour` from the
/// path and `user` from the authenticated account before deserialization.
#[derive(Debug, Deserialize)]
pub struct CreateReview {
    pub review: Option<String>,
    pub rating: Option<f64>,
    pub tour: Option<String>,
    pub user: Option<String>,
}

impl Payload for CreateReview {
    fn into_document(self) -> Result<Document> {
        let mut violations = Violations::new();

        let review = self.review.as_deref().map(str::trim).unwrap_or_default();
        if review.is_empty() {
            violations.add("review", "Review can not be empty");
        }
        if let Some(rating) = self.rating {
            check_rating(&mut violations, rating);
        }
        if self.tour.as_deref().map_or(true, str::is_empty) {
            violations.add("tour", "Review must belong to a tour");
        }
        if self.user.as_deref().map_or(true, str::is_empty) {
            violations.add("user", "Review must belong to a user");
        }

        let mut doc = Document::new();
        doc.insert("review".into(), json!(review));
        if let Some(rating) = self.rating {
            doc.insert("rating".into(), json!(rating));
        }
        doc.insert("tour".into(), json!(self.tour));
        doc.insert("user".into(), json!(self.user));

        violations.finish(doc)
    }
}

/// Payload for updating a review. The owning tour and user are fixed.
#[derive(Debug, Deserialize)]
pub struct UpdateReview {
    pub review: Option<String>,
    pub rating: Option<f64>,
}

impl Payload for UpdateReview {
    fn into_document(self) -> Result<Document> {
        let mut violations = Violations::new();
        let mut doc = Document::new();

        if let Some(review) = self.review {
            let review = review.trim().to_string();
            if review.is_empty() {
                violations.add("review", "Review can not be empty");
            }
            doc.insert("review".into(), json!(review));
        }
        if let Some(rating) = self.rating {
            check_rating(&mut violations, rating);
            doc.insert("rating".into(), json!(rating));
        }

        violations.finish(doc)
    }
}

/// Descriptor for the reviews collection.
pub struct Review;

impl Resource for Review {
    const COLLECTION: &'static str = COLLECTION;
    const ENTITY: &'static str = "Review";
    type Create = CreateReview;
    type Update = UpdateReview;

    fn parent() -> Option<(&'static str, &'static str)> {
        // the nested mount under /tours/{id}/reviews carries the tour id
        Some(("id", "tour"))
    }

    fn populate_one() -> &'static [PopulateSpec] {
        &POPULATE_USER
    }

    fn populate_many() -> &'static [PopulateSpec] {
        &POPULATE_USER
    }

    fn unique_keys() -> &'static [&'static [&'static str]] {
        // one review per user per tour
        &[&["tour", "user"]]
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;

    use super::*;

    #[test]
    fn test_create_requires_review_tour_user() {
        let payload = CreateReview {
            review: None,
            rating: None,
            tour: None,
            user: None,
        };
        let err = payload.into_document().unwrap_err();
        let AppError::ValidationFailed(violations) = err else {
            panic!("expected validation failure");
        };
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["review", "tour", "user"]);
    }

    #[test]
    fn test_create_rating_bounds() {
        let payload = CreateReview {
            review: Some("Lovely".to_string()),
            rating: Some(6.0),
            tour: Some("t1".to_string()),
            user: Some("u1".to_string()),
        };
        assert!(payload.into_document().is_err());

        let payload = CreateReview {
            review: Some("Lovely".to_string()),
            rating: Some(5.0),
            tour: Some("t1".to_string()),
            user: Some("u1".to_string()),
        };
        let doc = payload.into_document().unwrap();
        assert_eq!(doc["rating"], json!(5.0));
    }

    #[test]
    fn test_rating_is_optional() {
        let payload = CreateReview {
            review: Some("Nice views".to_string()),
            rating: None,
            tour: Some("t1".to_string()),
            user: Some("u1".to_string()),
        };
        let doc = payload.into_document().unwrap();
        assert!(!doc.contains_key("rating"));
    }

    #[test]
    fn test_update_cannot_move_review() {
        let payload = UpdateReview {
            review: Some("Edited".to_string()),
            rating: Some(4.0),
        };
        let doc = payload.into_document().unwrap();
        assert!(!doc.contains_key("tour"));
        assert!(!doc.contains_key("user"));
    }

    #[test]
    fn test_parent_scoping_declared() {
        assert_eq!(Review::parent(), Some(("id", "tour")));
    }
}
