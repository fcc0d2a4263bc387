//! Generic resource handler factory
//!
//! One implementation of the five standard collection operations (list,
//! read, create, update, delete), parameterized over a [`Resource`]
//! descriptor. The descriptor names the collection, the payload types,
//! optional parent scoping for nested routes, related-field expansion
//! specs, uniqueness keys, and fields that never leave the server.
//!
//! Each operation performs a single store round trip (plus one per
//! requested expansion, and one count per declared unique key on create).
//! Nothing here retries or formats errors; failures propagate to the
//! centralized formatter in [`crate::error`].
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::routing::get;
//!
//! Router::new()
//!     .route("/", get(crud::list_all::<Tour>).post(crud::create_one::<Tour>))
//!     .route(
//!         "/{id}",
//!         get(crud::read_one::<Tour>)
//!             .patch(crud::update_one::<Tour>)
//!             .delete(crud::delete_one::<Tour>),
//!     )
//! ```

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{
    doc_id, Document, DocumentStore, Filter, FilterCondition, FilterValue, Projection, QuerySpec,
    ID_FIELD,
};

use super::query::{QueryParams, QueryTranslator};
use super::response::Envelope;

/// How a populate spec resolves related documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateKind {
    /// The field holds one identifier (or an array of identifiers) into
    /// the related collection; each is replaced by the referenced
    /// document.
    Ref,
    /// The related collection holds a back-reference: documents whose
    /// `foreign_field` equals this document's identifier are attached
    /// under the spec's field name.
    Reverse {
        /// Field on the related collection holding the back-reference
        foreign_field: &'static str,
    },
}

/// Declarative related-field expansion.
#[derive(Debug, Clone, Copy)]
pub struct PopulateSpec {
    /// Field on this document to expand (Ref) or attach to (Reverse)
    pub field: &'static str,
    /// Related collection
    pub collection: &'static str,
    /// Fields of the related documents to include; empty means all
    pub select: &'static [&'static str],
    /// Resolution strategy
    pub kind: PopulateKind,
}

impl PopulateSpec {
    fn projection(&self) -> Projection {
        if self.select.is_empty() {
            Projection::All
        } else {
            Projection::Include(self.select.iter().map(|s| s.to_string()).collect())
        }
    }
}

/// A request payload that validates itself into a storable document.
///
/// Implementations collect every violated field constraint before
/// reporting, so a response can list all of them at once. Partial update
/// payloads serialize only the fields that were provided.
pub trait Payload: DeserializeOwned + Send + 'static {
    /// Validate and convert into a document, or fail with
    /// [`AppError::ValidationFailed`] carrying every violation.
    fn into_document(self) -> Result<Document>;
}

/// Descriptor of a collection the generic handlers operate on.
pub trait Resource: Send + Sync + 'static {
    /// Store collection name.
    const COLLECTION: &'static str;
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Payload for create operations.
    type Create: Payload;
    /// Payload for partial updates.
    type Update: Payload;

    /// Nested-route parent: `(path parameter, document field)`. A list
    /// request whose route carries the parameter is narrowed to documents
    /// whose field equals it.
    fn parent() -> Option<(&'static str, &'static str)> {
        None
    }

    /// Expansions applied when reading a single document.
    fn populate_one() -> &'static [PopulateSpec] {
        &[]
    }

    /// Expansions applied to list results.
    fn populate_many() -> &'static [PopulateSpec] {
        &[]
    }

    /// Field groups that must be unique across the collection.
    fn unique_keys() -> &'static [&'static [&'static str]] {
        &[]
    }

    /// Conditions silently applied to every read (e.g. hiding deactivated
    /// accounts).
    fn scope_filter() -> Filter {
        Filter::new()
    }

    /// Fields stripped from every outgoing document.
    fn private_fields() -> &'static [&'static str] {
        &[]
    }
}

fn strip_private<R: Resource>(doc: &mut Document) {
    for field in R::private_fields() {
        doc.remove(*field);
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Check descriptor-declared unique keys before a write. A group is only
/// checked when the candidate document carries all of its fields.
async fn ensure_unique<R: Resource>(
    store: &dyn DocumentStore,
    candidate: &Document,
    exclude_id: Option<&str>,
) -> Result<()> {
    for group in R::unique_keys() {
        let mut filter = Filter::new();
        let mut values = Vec::new();
        let complete = group.iter().all(|field| {
            match candidate.get(*field).and_then(FilterValue::from_json) {
                Some(value) => {
                    values.push(display_value(&candidate[*field]));
                    filter.push(FilterCondition::new(*field, crate::store::FilterOperator::Equal, value));
                    true
                }
                None => false,
            }
        });
        if !complete {
            continue;
        }
        if let Some(id) = exclude_id {
            filter.push(FilterCondition::ne(ID_FIELD, id));
        }
        if store.count(R::COLLECTION, &filter).await? > 0 {
            return Err(AppError::duplicate(
                R::ENTITY,
                group.join("+"),
                values.join(", "),
            ));
        }
    }
    Ok(())
}

/// Resolve populate specs against a batch of documents.
async fn expand(
    store: &dyn DocumentStore,
    specs: &[PopulateSpec],
    docs: &mut [Document],
) -> Result<()> {
    for spec in specs {
        match spec.kind {
            PopulateKind::Ref => expand_refs(store, spec, docs).await?,
            PopulateKind::Reverse { foreign_field } => {
                expand_reverse(store, spec, foreign_field, docs).await?;
            }
        }
    }
    Ok(())
}

async fn expand_refs(
    store: &dyn DocumentStore,
    spec: &PopulateSpec,
    docs: &mut [Document],
) -> Result<()> {
    let mut ids: Vec<String> = Vec::new();
    for doc in docs.iter() {
        match doc.get(spec.field) {
            Some(Value::String(id)) => ids.push(id.clone()),
            Some(Value::Array(items)) => {
                ids.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
    }
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

    let query = QuerySpec {
        filter: Filter::new().and(FilterCondition::in_strings(ID_FIELD, ids)),
        projection: spec.projection(),
        ..QuerySpec::unfiltered()
    };
    let related = store.find(spec.collection, &query).await?;
    let by_id: HashMap<String, Document> = related
        .into_iter()
        .filter_map(|doc| doc_id(&doc).map(|id| (id.to_string(), doc.clone())))
        .collect();

    for doc in docs.iter_mut() {
        let replacement = match doc.get(spec.field) {
            Some(Value::String(id)) => by_id.get(id).cloned().map(Value::Object),
            Some(Value::Array(items)) => {
                let resolved: Vec<Value> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|id| by_id.get(id).cloned())
                    .map(Value::Object)
                    .collect();
                Some(Value::Array(resolved))
            }
            _ => None,
        };
        if let Some(value) = replacement {
            doc.insert(spec.field.to_string(), value);
        }
    }
    Ok(())
}

async fn expand_reverse(
    store: &dyn DocumentStore,
    spec: &PopulateSpec,
    foreign_field: &'static str,
    docs: &mut [Document],
) -> Result<()> {
    let fetches = docs.iter().map(|doc| {
        let id = doc_id(doc).map(str::to_string);
        async move {
            match id {
                Some(id) => {
                    let query = QuerySpec {
                        filter: Filter::new().and(FilterCondition::eq(foreign_field, id)),
                        projection: spec.projection(),
                        ..QuerySpec::unfiltered()
                    };
                    store.find(spec.collection, &query).await
                }
                None => Ok(Vec::new()),
            }
        }
    });
    let related: Vec<Vec<Document>> = futures::future::try_join_all(fetches).await?;

    for (doc, related) in docs.iter_mut().zip(related) {
        doc.insert(
            spec.field.to_string(),
            Value::Array(related.into_iter().map(Value::Object).collect()),
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Core operations
// ---------------------------------------------------------------------------

/// List documents: scope filter, optional parent narrowing, then the query
/// translator over the raw request parameters.
pub async fn find_all<R: Resource>(
    store: &dyn DocumentStore,
    parent_id: Option<&str>,
    params: &QueryParams,
) -> Result<Vec<Document>> {
    let mut base = QuerySpec {
        filter: R::scope_filter(),
        ..QuerySpec::default()
    };
    if let (Some((_, field)), Some(id)) = (R::parent(), parent_id) {
        base.filter.push(FilterCondition::eq(field, id));
    }

    let query = QueryTranslator::translate(base, params);
    let mut docs = store.find(R::COLLECTION, &query).await?;
    expand(store, R::populate_many(), &mut docs).await?;
    for doc in &mut docs {
        strip_private::<R>(doc);
    }
    Ok(docs)
}

/// Fetch one document by identifier; missing or out-of-scope documents
/// are an explicit NotFound, never an empty success.
pub async fn find_one<R: Resource>(store: &dyn DocumentStore, id: &str) -> Result<Document> {
    let doc = store
        .find_by_id(R::COLLECTION, id)
        .await?
        .filter(|doc| R::scope_filter().matches(doc))
        .ok_or_else(|| AppError::not_found(R::ENTITY, id))?;

    let mut docs = vec![doc];
    expand(store, R::populate_one(), &mut docs).await?;
    let mut doc = docs.remove(0);
    strip_private::<R>(&mut doc);
    Ok(doc)
}

/// Validate and insert a new document.
pub async fn create_doc<R: Resource>(
    store: &dyn DocumentStore,
    payload: R::Create,
) -> Result<Document> {
    let doc = payload.into_document()?;
    ensure_unique::<R>(store, &doc, None).await?;
    let mut created = store.insert(R::COLLECTION, doc).await?;
    strip_private::<R>(&mut created);
    Ok(created)
}

/// Validate and apply a partial update by identifier.
pub async fn update_doc<R: Resource>(
    store: &dyn DocumentStore,
    id: &str,
    payload: R::Update,
) -> Result<Document> {
    let patch = payload.into_document()?;
    ensure_unique::<R>(store, &patch, Some(id)).await?;
    let mut updated = store
        .update(R::COLLECTION, id, patch)
        .await?
        .ok_or_else(|| AppError::not_found(R::ENTITY, id))?;
    strip_private::<R>(&mut updated);
    Ok(updated)
}

/// Remove a document by identifier.
pub async fn delete_doc<R: Resource>(store: &dyn DocumentStore, id: &str) -> Result<()> {
    let deleted = store.delete(R::COLLECTION, id).await?;
    if !deleted {
        return Err(AppError::not_found(R::ENTITY, id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Axum handlers
// ---------------------------------------------------------------------------

fn path_id(path: &HashMap<String, String>) -> Result<&str> {
    path.get("id")
        .map(String::as_str)
        .ok_or_else(|| AppError::BadRequest("missing id path parameter".to_string()))
}

/// `GET /` — list, with filtering/sorting/projection/pagination. The
/// route may or may not carry a parent path parameter, so extraction is
/// optional.
pub async fn list_all<R: Resource>(
    State(state): State<AppState>,
    path: Option<Path<HashMap<String, String>>>,
    Query(params): Query<QueryParams>,
) -> Result<Envelope> {
    let path = path.map(|Path(p)| p).unwrap_or_default();
    let parent_id = R::parent().and_then(|(param, _)| path.get(param)).cloned();
    let docs = find_all::<R>(state.store(), parent_id.as_deref(), &params).await?;
    Ok(Envelope::list(docs))
}

/// `GET /{id}` — read one.
pub async fn read_one<R: Resource>(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Envelope> {
    let doc = find_one::<R>(state.store(), path_id(&path)?).await?;
    Ok(Envelope::single("document", Value::Object(doc)))
}

/// `POST /` — create.
pub async fn create_one<R: Resource>(
    State(state): State<AppState>,
    Json(payload): Json<R::Create>,
) -> Result<Envelope> {
    let doc = create_doc::<R>(state.store(), payload).await?;
    Ok(Envelope::created("document", Value::Object(doc)))
}

/// `PATCH /{id}` — partial update.
pub async fn update_one<R: Resource>(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
    Json(payload): Json<R::Update>,
) -> Result<Envelope> {
    let doc = update_doc::<R>(state.store(), path_id(&path)?, payload).await?;
    Ok(Envelope::single("document", Value::Object(doc)))
}

/// `DELETE /{id}` — delete, empty success body.
pub async fn delete_one<R: Resource>(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Envelope> {
    delete_doc::<R>(state.store(), path_id(&path)?).await?;
    Ok(Envelope::no_content())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use crate::error::FieldViolation;
    use crate::store::MemoryStore;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct CreateTrinket {
        name: Option<String>,
        size: Option<f64>,
        owner: Option<String>,
    }

    impl Payload for CreateTrinket {
        fn into_document(self) -> Result<Document> {
            let mut violations = Vec::new();
            if self.name.as_deref().map_or(true, str::is_empty) {
                violations.push(FieldViolation::new("name", "A trinket must have a name"));
            }
            if self.size.map_or(true, |s| s <= 0.0) {
                violations.push(FieldViolation::new("size", "Size must be positive"));
            }
            if !violations.is_empty() {
                return Err(AppError::ValidationFailed(violations));
            }
            let mut doc = Document::new();
            doc.insert("name".into(), json!(self.name.unwrap()));
            doc.insert("size".into(), json!(self.size.unwrap()));
            if let Some(owner) = self.owner {
                doc.insert("owner".into(), json!(owner));
            }
            doc.insert("secret_code".into(), json!("classified"));
            Ok(doc)
        }
    }

    #[derive(Debug, Deserialize)]
    struct UpdateTrinket {
        name: Option<String>,
        size: Option<f64>,
    }

    impl Payload for UpdateTrinket {
        fn into_document(self) -> Result<Document> {
            let mut violations = Vec::new();
            if self.name.as_deref().is_some_and(str::is_empty) {
                violations.push(FieldViolation::new("name", "A trinket must have a name"));
            }
            if self.size.is_some_and(|s| s <= 0.0) {
                violations.push(FieldViolation::new("size", "Size must be positive"));
            }
            if !violations.is_empty() {
                return Err(AppError::ValidationFailed(violations));
            }
            let mut doc = Document::new();
            if let Some(name) = self.name {
                doc.insert("name".into(), json!(name));
            }
            if let Some(size) = self.size {
                doc.insert("size".into(), json!(size));
            }
            Ok(doc)
        }
    }

    struct Trinket;

    impl Resource for Trinket {
        const COLLECTION: &'static str = "trinkets";
        const ENTITY: &'static str = "Trinket";
        type Create = CreateTrinket;
        type Update = UpdateTrinket;

        fn parent() -> Option<(&'static str, &'static str)> {
            Some(("owner_id", "owner"))
        }

        fn unique_keys() -> &'static [&'static [&'static str]] {
            &[&["name"]]
        }

        fn private_fields() -> &'static [&'static str] {
            &["secret_code"]
        }
    }

    fn create(name: &str, size: f64, owner: Option<&str>) -> CreateTrinket {
        CreateTrinket {
            name: Some(name.to_string()),
            size: Some(size),
            owner: owner.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = MemoryStore::connect();
        let doc = create_doc::<Trinket>(&store, create("compass", 2.0, None))
            .await
            .unwrap();
        let id = doc_id(&doc).unwrap();
        assert!(!doc.contains_key("secret_code"));

        let found = find_one::<Trinket>(&store, id).await.unwrap();
        assert_eq!(found["name"], json!("compass"));
        assert!(!found.contains_key("secret_code"));
    }

    #[tokio::test]
    async fn test_create_collects_all_violations() {
        let store = MemoryStore::connect();
        let payload = CreateTrinket {
            name: None,
            size: Some(-1.0),
            owner: None,
        };
        let err = create_doc::<Trinket>(&store, payload).await.unwrap_err();
        match err {
            AppError::ValidationFailed(violations) => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = MemoryStore::connect();
        create_doc::<Trinket>(&store, create("compass", 2.0, None))
            .await
            .unwrap();
        let err = create_doc::<Trinket>(&store, create("compass", 3.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let store = MemoryStore::connect();
        let err = find_one::<Trinket>(&store, "missing-id").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_and_not_found() {
        let store = MemoryStore::connect();
        let doc = create_doc::<Trinket>(&store, create("compass", 2.0, None))
            .await
            .unwrap();
        let id = doc_id(&doc).unwrap();

        let updated = update_doc::<Trinket>(
            &store,
            id,
            UpdateTrinket {
                name: None,
                size: Some(5.0),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated["size"], json!(5.0));
        assert_eq!(updated["name"], json!("compass"));

        let err = update_doc::<Trinket>(
            &store,
            "missing-id",
            UpdateTrinket {
                name: None,
                size: Some(5.0),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_validates_patch() {
        let store = MemoryStore::connect();
        let doc = create_doc::<Trinket>(&store, create("compass", 2.0, None))
            .await
            .unwrap();
        let err = update_doc::<Trinket>(
            &store,
            doc_id(&doc).unwrap(),
            UpdateTrinket {
                name: Some(String::new()),
                size: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_delete_and_not_found() {
        let store = MemoryStore::connect();
        let doc = create_doc::<Trinket>(&store, create("compass", 2.0, None))
            .await
            .unwrap();
        let id = doc_id(&doc).unwrap();
        delete_doc::<Trinket>(&store, id).await.unwrap();
        let err = delete_doc::<Trinket>(&store, id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_scopes_to_parent() {
        let store = MemoryStore::connect();
        create_doc::<Trinket>(&store, create("compass", 2.0, Some("alice")))
            .await
            .unwrap();
        create_doc::<Trinket>(&store, create("sextant", 3.0, Some("bob")))
            .await
            .unwrap();

        let params = QueryParams::new();
        let all = find_all::<Trinket>(&store, None, &params).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = find_all::<Trinket>(&store, Some("alice"), &params)
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0]["name"], json!("compass"));
    }

    #[tokio::test]
    async fn test_list_applies_query_params_and_strips_private() {
        let store = MemoryStore::connect();
        for (name, size) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            create_doc::<Trinket>(&store, create(name, size, None))
                .await
                .unwrap();
        }
        let params: QueryParams = [
            ("size[gte]".to_string(), "2".to_string()),
            ("sort".to_string(), "-size".to_string()),
        ]
        .into();
        let docs = find_all::<Trinket>(&store, None, &params).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["c", "b"]);
        assert!(docs.iter().all(|d| !d.contains_key("secret_code")));
    }

    #[tokio::test]
    async fn test_expand_ref_and_reverse() {
        let store = MemoryStore::connect();
        let owner = store
            .insert(
                "owners",
                json!({"name": "Alice", "hidden": "x"}).as_object().unwrap().clone(),
            )
            .await
            .unwrap();
        let owner_id = doc_id(&owner).unwrap().to_string();
        let mut doc = Document::new();
        doc.insert("id".into(), json!("t1"));
        doc.insert("owner".into(), json!(owner_id));
        store.insert("things", doc.clone()).await.unwrap();
        store
            .insert(
                "notes",
                json!({"thing": "t1", "text": "nice"}).as_object().unwrap().clone(),
            )
            .await
            .unwrap();

        let specs = [
            PopulateSpec {
                field: "owner",
                collection: "owners",
                select: &["name"],
                kind: PopulateKind::Ref,
            },
            PopulateSpec {
                field: "notes",
                collection: "notes",
                select: &[],
                kind: PopulateKind::Reverse {
                    foreign_field: "thing",
                },
            },
        ];
        let mut docs = vec![doc];
        expand(&store, &specs, &mut docs).await.unwrap();

        let owner = docs[0]["owner"].as_object().unwrap();
        assert_eq!(owner["name"], json!("Alice"));
        assert!(!owner.contains_key("hidden"));

        let notes = docs[0]["notes"].as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["text"], json!("nice"));
    }
}
