//! Response envelope for successful handler output
//!
//! Every successful JSON response follows the fixed shape
//! `{"status": "success", "results": <count>?, "data": {...}}`, with
//! optional extra top-level fields (e.g. the auth token).
//!
//! # Example
//!
//! ```rust
//! use trailhead_service::handlers::Envelope;
//! use serde_json::json;
//!
//! let envelope = Envelope::single("document", json!({"name": "Forest Hiker"}));
//! let body = serde_json::to_value(&envelope).unwrap();
//! assert_eq!(body["status"], "success");
//! assert_eq!(body["data"]["document"]["name"], "Forest Hiker");
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::store::Document;

/// Uniform success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Always `"success"` for this type; errors use the centralized
    /// formatter instead.
    pub status: &'static str,

    /// Number of documents, present on list responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,

    /// Response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Extra top-level fields (e.g. `token`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    code: StatusCode,
}

impl Envelope {
    fn new(code: StatusCode, results: Option<usize>, data: Option<Value>) -> Self {
        Self {
            status: "success",
            results,
            data,
            extra: Map::new(),
            code,
        }
    }

    /// 200 with `data: {documents: [...]}` and a `results` count.
    #[must_use]
    pub fn list(documents: Vec<Document>) -> Self {
        let results = documents.len();
        let docs = documents.into_iter().map(Value::Object).collect();
        let mut data = Map::new();
        data.insert("documents".to_string(), Value::Array(docs));
        Self::new(StatusCode::OK, Some(results), Some(Value::Object(data)))
    }

    /// 200 with `data: {<key>: value}`.
    #[must_use]
    pub fn single(key: &str, value: impl Serialize) -> Self {
        let mut data = Map::new();
        data.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        Self::new(StatusCode::OK, None, Some(Value::Object(data)))
    }

    /// 201 with `data: {<key>: value}`.
    #[must_use]
    pub fn created(key: &str, value: impl Serialize) -> Self {
        let mut envelope = Self::single(key, value);
        envelope.code = StatusCode::CREATED;
        envelope
    }

    /// 204 with no body.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT, None, None)
    }

    /// 200 with no data (e.g. logout, mail confirmations).
    #[must_use]
    pub fn message_only() -> Self {
        Self::new(StatusCode::OK, None, None)
    }

    /// Attach an extra top-level field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.extra.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        self
    }

    /// The HTTP status this envelope renders with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.code
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        if self.code == StatusCode::NO_CONTENT {
            return StatusCode::NO_CONTENT.into_response();
        }
        (self.code, Json(self)).into_response()
    }
}
