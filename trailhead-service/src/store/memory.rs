//! In-memory document store
//!
//! A process-local [`DocumentStore`] backend over concurrent hash maps.
//! Collections are created lazily on first insert. Every document receives
//! a UUID identifier and an insertion timestamp; updates bump the internal
//! revision counter.
//!
//! The handle is constructed once by the process entry point and passed
//! explicitly into application state; there is no global connection.

use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use super::document::{
    cmp_values, get_path, now_rfc3339, Document, CREATED_AT_FIELD, ID_FIELD, REVISION_FIELD,
};
use super::filter::Filter;
use super::query::{OrderDirection, QuerySpec};
use super::{DocumentStore, StoreResult};

/// In-memory store backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, DashMap<String, Document>>,
}

impl MemoryStore {
    /// Open a fresh, empty store.
    #[must_use]
    pub fn connect() -> Self {
        tracing::info!("document store connected (in-memory backend)");
        Self::default()
    }

    /// Release the store. Dropping all collections makes accidental use
    /// after shutdown observable in tests.
    pub fn shutdown(&self) {
        self.collections.clear();
        tracing::info!("document store disconnected");
    }

    fn sort_documents(docs: &mut [Document], query: &QuerySpec) {
        if query.sort.is_empty() {
            return;
        }
        docs.sort_by(|a, b| {
            for key in &query.sort {
                let left = get_path(a, &key.field).unwrap_or(&Value::Null);
                let right = get_path(b, &key.field).unwrap_or(&Value::Null);
                let ordering = match key.direction {
                    OrderDirection::Ascending => cmp_values(left, right),
                    OrderDirection::Descending => cmp_values(right, left),
                };
                if ordering != std::cmp::Ordering::Equal {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, query: &QuerySpec) -> StoreResult<Vec<Document>> {
        let Some(col) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        // filter -> sort -> projection -> pagination
        let mut docs: Vec<Document> = col
            .iter()
            .filter(|entry| query.filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        drop(col);

        Self::sort_documents(&mut docs, query);

        let shaped = docs.iter().map(|doc| query.projection.apply(doc));
        let offset = usize::try_from(query.pagination.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.pagination.limit).unwrap_or(usize::MAX);
        Ok(shaped.skip(offset).take(limit).collect())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let Some(col) = self.collections.get(collection) else {
            return Ok(None);
        };
        let doc = col.get(id).map(|entry| {
            let mut doc = entry.value().clone();
            doc.remove(REVISION_FIELD);
            doc
        });
        Ok(doc)
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        let id = match doc.get(ID_FIELD).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };
        if !doc.contains_key(CREATED_AT_FIELD) {
            doc.insert(CREATED_AT_FIELD.to_string(), Value::String(now_rfc3339()));
        }
        doc.insert(REVISION_FIELD.to_string(), Value::from(1u64));

        let col = self
            .collections
            .entry(collection.to_string())
            .or_default();
        col.insert(id, doc.clone());

        doc.remove(REVISION_FIELD);
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        let Some(col) = self.collections.get(collection) else {
            return Ok(None);
        };
        let Some(mut entry) = col.get_mut(id) else {
            return Ok(None);
        };

        let doc = entry.value_mut();
        for (field, value) in patch {
            // the reserved fields are owned by the store
            if field == ID_FIELD || field == CREATED_AT_FIELD || field == REVISION_FIELD {
                continue;
            }
            doc.insert(field, value);
        }
        let revision = doc
            .get(REVISION_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        doc.insert(REVISION_FIELD.to_string(), Value::from(revision + 1));

        let mut updated = doc.clone();
        updated.remove(REVISION_FIELD);
        Ok(Some(updated))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let Some(col) = self.collections.get(collection) else {
            return Ok(false);
        };
        Ok(col.remove(id).is_some())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let Some(col) = self.collections.get(collection) else {
            return Ok(0);
        };
        let count = col
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count();
        Ok(count as u64)
    }
}
