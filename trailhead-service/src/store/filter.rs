//! Filter conditions for document queries
//!
//! A [`Filter`] is a conjunction of [`FilterCondition`]s. Conditions carry
//! a field name, a comparison operator, and a literal value. Filters can be
//! serialized to (and parsed back from) the store's wire form, where
//! comparison operators use the `$`-prefixed keyword convention:
//!
//! ```json
//! { "difficulty": "easy", "price": { "$gte": 100.0 } }
//! ```
//!
//! # Example
//!
//! ```rust
//! use trailhead_service::store::{Filter, FilterCondition};
//!
//! let filter = Filter::new()
//!     .and(FilterCondition::eq("difficulty", "easy"))
//!     .and(FilterCondition::gte("price", 100.0));
//! assert_eq!(filter.len(), 2);
//! ```

use std::fmt;

use serde_json::Value;

use super::document::{get_path, Document};

/// Comparison operators for filter conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equal to
    Equal,
    /// Not equal to
    NotEqual,
    /// Greater than
    GreaterThan,
    /// Greater than or equal to
    GreaterThanOrEqual,
    /// Less than
    LessThan,
    /// Less than or equal to
    LessThanOrEqual,
    /// Value is one of a list
    In,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FilterOperator {
    /// The `$`-prefixed keyword used in the store's wire form.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Equal => "$eq",
            Self::NotEqual => "$ne",
            Self::GreaterThan => "$gt",
            Self::GreaterThanOrEqual => "$gte",
            Self::LessThan => "$lt",
            Self::LessThanOrEqual => "$lte",
            Self::In => "$in",
        }
    }

    /// Parse a bare query-string keyword (`gte`, `gt`, `lte`, `lt`).
    #[must_use]
    pub fn from_query_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gte" => Some(Self::GreaterThanOrEqual),
            "gt" => Some(Self::GreaterThan),
            "lte" => Some(Self::LessThanOrEqual),
            "lt" => Some(Self::LessThan),
            _ => None,
        }
    }

    /// Parse a `$`-prefixed wire keyword.
    #[must_use]
    pub fn from_wire_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "$eq" => Some(Self::Equal),
            "$ne" => Some(Self::NotEqual),
            "$gt" => Some(Self::GreaterThan),
            "$gte" => Some(Self::GreaterThanOrEqual),
            "$lt" => Some(Self::LessThan),
            "$lte" => Some(Self::LessThanOrEqual),
            "$in" => Some(Self::In),
            _ => None,
        }
    }
}

/// A literal value used in filter comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// Numeric value (all numbers compare as `f64`)
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// List of values (for the `In` operator)
    List(Vec<FilterValue>),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl FilterValue {
    /// Parse a raw query-string literal.
    ///
    /// Numeric-looking and boolean literals are coerced so that
    /// comparisons against numeric document fields behave numerically;
    /// everything else stays a string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<f64>() {
            return Self::Number(n);
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::String(raw.to_string()),
        }
    }

    /// Convert a JSON value into a filter literal, if representable.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Array(items) => {
                let list: Option<Vec<_>> = items.iter().map(Self::from_json).collect();
                list.map(Self::List)
            }
            _ => None,
        }
    }

    /// The JSON representation used in the wire form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Loose equality against a document value: numbers compare as `f64`,
    /// strings holding numbers compare numerically against numeric
    /// literals.
    fn loosely_equals(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(s), Value::String(v)) => s == v,
            (Self::Number(n), Value::Number(v)) => {
                v.as_f64().map(|v| v == *n).unwrap_or(false)
            }
            (Self::Number(n), Value::String(v)) => {
                v.parse::<f64>().map(|v| v == *n).unwrap_or(false)
            }
            (Self::Bool(b), Value::Bool(v)) => b == v,
            _ => false,
        }
    }

    /// Partial ordering of a document value relative to this literal.
    fn compare(&self, value: &Value) -> Option<std::cmp::Ordering> {
        match (self, value) {
            (Self::Number(n), Value::Number(v)) => v.as_f64().map(|v| v.total_cmp(n)),
            (Self::Number(n), Value::String(v)) => {
                v.parse::<f64>().ok().map(|v| v.total_cmp(n))
            }
            (Self::String(s), Value::String(v)) => Some(v.as_str().cmp(s.as_str())),
            _ => None,
        }
    }
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Field name (dotted paths allowed)
    pub field: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Literal to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a condition from its parts.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Equality condition (`field == value`).
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }

    /// Inequality condition (`field != value`). Matches documents where
    /// the field is absent.
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value)
    }

    /// Greater-than condition.
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value)
    }

    /// Greater-than-or-equal condition.
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value)
    }

    /// Less-than condition.
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value)
    }

    /// Less-than-or-equal condition.
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value)
    }

    /// Membership condition over a list of string values.
    pub fn in_strings(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(
            field,
            FilterOperator::In,
            FilterValue::List(values.into_iter().map(FilterValue::String).collect()),
        )
    }

    /// Whether a document satisfies this condition.
    ///
    /// Absent (or `null`) fields fail every comparison except `NotEqual`,
    /// which they satisfy.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let value = match get_path(doc, &self.field) {
            Some(v) if !v.is_null() => v,
            _ => return self.operator == FilterOperator::NotEqual,
        };

        use std::cmp::Ordering;
        match self.operator {
            FilterOperator::Equal => self.value.loosely_equals(value),
            FilterOperator::NotEqual => !self.value.loosely_equals(value),
            FilterOperator::GreaterThan => {
                matches!(self.value.compare(value), Some(Ordering::Greater))
            }
            FilterOperator::GreaterThanOrEqual => matches!(
                self.value.compare(value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => {
                matches!(self.value.compare(value), Some(Ordering::Less))
            }
            FilterOperator::LessThanOrEqual => matches!(
                self.value.compare(value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::In => match &self.value {
                FilterValue::List(items) => items.iter().any(|item| item.loosely_equals(value)),
                other => other.loosely_equals(value),
            },
        }
    }
}

/// A conjunction of filter conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<FilterCondition>,
}

impl Filter {
    /// Create an empty filter (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, consuming self (builder form).
    #[must_use]
    pub fn and(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a condition in place.
    pub fn push(&mut self, condition: FilterCondition) {
        self.conditions.push(condition);
    }

    /// Number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Iterate over the conditions.
    pub fn conditions(&self) -> impl Iterator<Item = &FilterCondition> {
        self.conditions.iter()
    }

    /// Whether a document satisfies every condition.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }

    /// Serialize to the wire form: equality conditions become bare values,
    /// comparisons become `{ "$op": value }` objects (merged per field).
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut out = Document::new();
        for condition in &self.conditions {
            let literal = condition.value.to_json();
            if condition.operator == FilterOperator::Equal {
                out.insert(condition.field.clone(), literal);
                continue;
            }
            let entry = out
                .entry(condition.field.clone())
                .or_insert_with(|| Value::Object(Document::new()));
            if let Value::Object(ops) = entry {
                ops.insert(condition.operator.keyword().to_string(), literal);
            }
        }
        out
    }

    /// Parse the wire form back into a filter.
    ///
    /// Unrecognized `$` keywords are ignored; bare values become equality
    /// conditions.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let mut filter = Self::new();
        for (field, value) in doc {
            match value {
                Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                    for (keyword, literal) in ops {
                        let Some(operator) = FilterOperator::from_wire_keyword(keyword) else {
                            continue;
                        };
                        if let Some(value) = FilterValue::from_json(literal) {
                            filter.push(FilterCondition::new(field.clone(), operator, value));
                        }
                    }
                }
                other => {
                    if let Some(value) = FilterValue::from_json(other) {
                        filter.push(FilterCondition::eq(field.clone(), value));
                    }
                }
            }
        }
        filter
    }
}
