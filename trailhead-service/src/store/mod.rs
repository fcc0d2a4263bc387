//! Document storage collaborator
//!
//! The application consumes its document database through the narrow
//! [`DocumentStore`] trait: find-by-query, find-by-id, insert, update,
//! delete, and count. Queries arrive as a fully configured
//! [`QuerySpec`] (filter → sort → projection → pagination) and execute in
//! a single call; the store performs no validation and knows nothing about
//! the shapes of the documents it holds.
//!
//! The handle is created by the process entry point and injected into
//! application state as `Arc<dyn DocumentStore>`.

pub mod document;
pub mod filter;
pub mod memory;
pub mod query;

use thiserror::Error;

pub use document::{
    doc_id, get_path, now_rfc3339, Document, CREATED_AT_FIELD, ID_FIELD, REVISION_FIELD,
};
pub use filter::{Filter, FilterCondition, FilterOperator, FilterValue};
pub use memory::MemoryStore;
pub use query::{OrderDirection, Pagination, Projection, QuerySpec, SortKey, DEFAULT_LIMIT};

/// Errors surfaced by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backing medium failed (seed files, future disk backends)
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Narrow interface to the document database.
///
/// Implementations must provide stable string identifiers, comparison
/// operator filters, and filter → sort → projection → pagination execution
/// of a complete [`QuerySpec`] in one round trip.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Execute a fully configured query against a collection.
    async fn find(&self, collection: &str, query: &QuerySpec) -> StoreResult<Vec<Document>>;

    /// Fetch a single document by identifier.
    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Insert a document, assigning identifier and creation timestamp if
    /// absent. Returns the stored document.
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    /// Apply a partial update to a document by identifier. Returns the
    /// updated document, or `None` if no document matched.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>>;

    /// Remove a document by identifier. Returns whether one was removed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Count documents matching a filter.
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;
}
