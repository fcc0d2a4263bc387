//! Tour rating aggregates
//!
//! Recomputes a tour's `ratings_quantity` and `ratings_average` from its
//! reviews. Invoked explicitly by the review routes after every
//! successful create, update, or delete, so the side effect is visible at
//! the call site.

use serde_json::{json, Value};

use crate::error::Result;
use crate::models::{review, tour};
use crate::store::{Document, DocumentStore, Filter, FilterCondition, QuerySpec};

/// Average rating assigned to tours with no reviews.
pub const DEFAULT_RATING: f64 = 4.5;

/// Recompute and persist a tour's rating aggregates.
pub async fn recompute_tour_ratings(store: &dyn DocumentStore, tour_id: &str) -> Result<()> {
    let query =
        QuerySpec::filtered(Filter::new().and(FilterCondition::eq("tour", tour_id)));
    let reviews = store.find(review::COLLECTION, &query).await?;

    let ratings: Vec<f64> = reviews
        .iter()
        .filter_map(|doc| doc.get("rating").and_then(Value::as_f64))
        .collect();

    let (quantity, average) = if ratings.is_empty() {
        (0, DEFAULT_RATING)
    } else {
        let sum: f64 = ratings.iter().sum();
        let average = sum / ratings.len() as f64;
        // one decimal place
        (ratings.len() as u64, (average * 10.0).round() / 10.0)
    };

    let mut patch = Document::new();
    patch.insert("ratings_quantity".into(), json!(quantity));
    patch.insert("ratings_average".into(), json!(average));
    store.update(tour::COLLECTION, tour_id, patch).await?;
    Ok(())
}
