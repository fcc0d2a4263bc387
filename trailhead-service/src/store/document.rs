//! Document representation and value helpers
//!
//! Documents are schema-less JSON objects. The store reserves three fields:
//! [`ID_FIELD`] (stable string identifier), [`CREATED_AT_FIELD`] (RFC 3339
//! UTC timestamp assigned on insert), and [`REVISION_FIELD`] (internal
//! revision counter bumped on every update, excluded from default
//! projections).

use std::cmp::Ordering;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// A single stored document.
pub type Document = serde_json::Map<String, Value>;

/// Field holding the document identifier.
pub const ID_FIELD: &str = "id";

/// Field holding the insertion timestamp.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Internal revision counter, hidden from default projections.
pub const REVISION_FIELD: &str = "__rev";

/// Get the identifier of a document, if present.
#[must_use]
pub fn doc_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Current time as an RFC 3339 UTC string with millisecond precision.
///
/// All timestamps stored by this service use this format. Because the
/// offset is always `Z` and the precision fixed, lexicographic comparison
/// of two stored timestamps agrees with chronological order.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Look up a possibly dotted path (`"start_location.coordinates"`) in a
/// document.
#[must_use]
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Total ordering over JSON values used for sorting.
///
/// Values of different types order by type rank (null < bool < number <
/// string < array < object); numbers compare as `f64`, strings
/// lexicographically.
#[must_use]
pub fn cmp_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
