//! Development data seeding
//!
//! Loads a JSON file of collections into the store at startup when
//! `store.seed_file` is configured. The file holds arrays of documents
//! keyed by collection name; absent collections are skipped.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::models::{booking, review, tour, user};
use crate::store::{Document, DocumentStore, StoreError};

#[derive(Debug, Default, Deserialize)]
struct SeedData {
    #[serde(default)]
    tours: Vec<Document>,
    #[serde(default)]
    users: Vec<Document>,
    #[serde(default)]
    reviews: Vec<Document>,
    #[serde(default)]
    bookings: Vec<Document>,
}

/// Load seed collections from a JSON file into the store.
pub async fn load(store: &dyn DocumentStore, path: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(StoreError::from)?;
    let data: SeedData =
        serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let counts = [
        (tour::COLLECTION, data.tours),
        (user::COLLECTION, data.users),
        (review::COLLECTION, data.reviews),
        (booking::COLLECTION, data.bookings),
    ];
    for (collection, docs) in counts {
        let count = docs.len();
        for doc in docs {
            store.insert(collection, doc).await?;
        }
        if count > 0 {
            tracing::info!(collection, count, "seeded collection");
        }
    }
    Ok(())
}
