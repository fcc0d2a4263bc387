//! Query specification: sort, projection, and pagination
//!
//! A [`QuerySpec`] is the fully configured, not-yet-executed form of a
//! collection query: filter, ordered sort keys, field projection, and
//! pagination. It is built fresh per request (usually by the query
//! translator in `handlers::query`), handed to
//! [`DocumentStore::find`](super::DocumentStore::find) exactly once, and
//! discarded.

use std::fmt;

use super::document::{Document, ID_FIELD, REVISION_FIELD};
use super::filter::Filter;

/// Default number of documents returned by a list query when no `limit`
/// parameter is given. No upper bound is enforced on explicit limits.
pub const DEFAULT_LIMIT: u64 = 100;

/// Direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending (A-Z, 0-9, oldest first)
    #[default]
    Ascending,
    /// Descending (Z-A, 9-0, newest first)
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// One sort key: a field name and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: OrderDirection,
}

impl SortKey {
    /// Ascending sort key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Ascending,
        }
    }

    /// Descending sort key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Descending,
        }
    }
}

/// Field projection applied to returned documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// Return every field except the internal revision counter.
    #[default]
    All,
    /// Return only the named fields. The identifier field is always
    /// included, whether named or not.
    Include(Vec<String>),
}

impl Projection {
    /// Apply the projection to a document, producing the shaped copy.
    #[must_use]
    pub fn apply(&self, doc: &Document) -> Document {
        match self {
            Self::All => {
                let mut out = doc.clone();
                out.remove(REVISION_FIELD);
                out
            }
            Self::Include(fields) => {
                let mut out = Document::new();
                if let Some(id) = doc.get(ID_FIELD) {
                    out.insert(ID_FIELD.to_string(), id.clone());
                }
                for field in fields {
                    if field == ID_FIELD {
                        continue;
                    }
                    if let Some(value) = doc.get(field) {
                        out.insert(field.clone(), value.clone());
                    }
                }
                out
            }
        }
    }
}

/// Pagination parameters: skip `offset`, take `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Number of documents to skip
    pub offset: u64,
    /// Maximum number of documents to return
    pub limit: u64,
}

impl Pagination {
    /// Create pagination from raw offset and limit.
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Pagination for a 1-indexed page number: skips `(page - 1) * limit`.
    #[must_use]
    pub const fn page(page_number: u64, limit: u64) -> Self {
        Self {
            offset: page_number.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }

    /// Unbounded pagination: every matching document.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            offset: 0,
            limit: u64::MAX,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A fully configured collection query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// Filter conditions (conjunction)
    pub filter: Filter,
    /// Sort keys, applied in order; empty means unspecified order
    pub sort: Vec<SortKey>,
    /// Field projection
    pub projection: Projection,
    /// Pagination window
    pub pagination: Pagination,
}

impl QuerySpec {
    /// A query matching every document in a collection.
    #[must_use]
    pub fn unfiltered() -> Self {
        Self {
            pagination: Pagination::all(),
            ..Self::default()
        }
    }

    /// A query over every document matching `filter`.
    #[must_use]
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            pagination: Pagination::all(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn test_order_direction_display() {
        assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
        assert_eq!(format!("{}", OrderDirection::Descending), "desc");
    }

    #[test]
    fn test_projection_all_hides_revision() {
        let d = doc(json!({"id": "1", "name": "x", "__rev": 3}));
        let shaped = Projection::All.apply(&d);
        assert_eq!(shaped.get("name"), Some(&json!("x")));
        assert!(!shaped.contains_key("__rev"));
    }

    #[test]
    fn test_projection_include_keeps_id() {
        let d = doc(json!({"id": "1", "name": "x", "price": 9, "summary": "s"}));
        let shaped =
            Projection::Include(vec!["name".to_string(), "price".to_string()]).apply(&d);
        assert_eq!(shaped.len(), 3);
        assert!(shaped.contains_key("id"));
        assert!(shaped.contains_key("name"));
        assert!(shaped.contains_key("price"));
        assert!(!shaped.contains_key("summary"));
    }

    #[test]
    fn test_projection_include_unknown_field() {
        let d = doc(json!({"id": "1", "name": "x"}));
        let shaped = Projection::Include(vec!["nope".to_string()]).apply(&d);
        assert_eq!(shaped.len(), 1);
        assert!(shaped.contains_key("id"));
    }

    #[test]
    fn test_pagination_page_offsets() {
        assert_eq!(Pagination::page(1, 100).offset, 0);
        assert_eq!(Pagination::page(2, 100).offset, 100);
        assert_eq!(Pagination::page(3, 50).offset, 100);
        // page 0 clamps like page 1
        assert_eq!(Pagination::page(0, 20).offset, 0);
    }

    #[test]
    fn test_pagination_default() {
        let p = Pagination::default();
        assert_eq!(p.offset, 0);
        assert_eq!(p.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_query_spec_unfiltered() {
        let q = QuerySpec::unfiltered();
        assert!(q.filter.is_empty());
        assert_eq!(q.pagination.limit, u64::MAX);
    }
}
