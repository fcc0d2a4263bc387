//! Query translator for list operations
//!
//! Turns the raw query parameters of a list request into a fully
//! configured [`QuerySpec`]: filter, sort, field projection, and
//! pagination. The four steps chain on one builder and must run in the
//! fixed order `filter → sort → limit_fields → paginate`; pagination last
//! so the window applies to the filtered, ordered set.
//!
//! The translator only reads the raw parameters; it never mutates them.
//! It performs no validation of its own: unrecognized parameter names pass
//! through as equality filters (matching nothing is an accepted outcome,
//! not an error), and malformed numeric `page`/`limit` values fall back to
//! their defaults.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use trailhead_service::handlers::QueryTranslator;
//! use trailhead_service::store::QuerySpec;
//!
//! let params: HashMap<String, String> = [
//!     ("difficulty".to_string(), "easy".to_string()),
//!     ("price[gte]".to_string(), "100".to_string()),
//!     ("sort".to_string(), "-ratings_average".to_string()),
//!     ("limit".to_string(), "2".to_string()),
//! ]
//! .into();
//!
//! let query = QueryTranslator::new(QuerySpec::default(), &params)
//!     .filter()
//!     .sort()
//!     .limit_fields()
//!     .paginate()
//!     .apply();
//! assert_eq!(query.filter.len(), 2);
//! assert_eq!(query.pagination.limit, 2);
//! ```

use std::collections::HashMap;

use crate::store::{
    FilterCondition, FilterOperator, FilterValue, Pagination, Projection, QuerySpec, SortKey,
    CREATED_AT_FIELD, DEFAULT_LIMIT,
};

/// Parameter names with control meaning; never treated as filters.
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Raw query parameters as extracted from the request.
pub type QueryParams = HashMap<String, String>;

/// Builder translating raw request parameters into a [`QuerySpec`].
#[derive(Debug)]
pub struct QueryTranslator<'a> {
    params: &'a QueryParams,
    query: QuerySpec,
}

impl<'a> QueryTranslator<'a> {
    /// Wrap a base query (which may already carry scope conditions, e.g. a
    /// parent-id filter for nested routes) and the request parameters.
    #[must_use]
    pub fn new(base: QuerySpec, params: &'a QueryParams) -> Self {
        Self {
            params,
            query: base,
        }
    }

    /// Run all four translation steps in their required order.
    #[must_use]
    pub fn translate(base: QuerySpec, params: &'a QueryParams) -> QuerySpec {
        Self::new(base, params)
            .filter()
            .sort()
            .limit_fields()
            .paginate()
            .apply()
    }

    /// Translate every non-reserved parameter into a filter condition.
    ///
    /// `field[op]` keys with `op` in `gte|gt|lte|lt` become comparison
    /// conditions (rewritten to the store's `$`-keyword convention when
    /// serialized); everything else is an equality condition.
    #[must_use]
    pub fn filter(mut self) -> Self {
        for (key, raw) in self.params {
            let (field, operator) = split_operator(key);
            if RESERVED_KEYS.contains(&field) {
                continue;
            }
            let value = FilterValue::parse(raw);
            self.query
                .filter
                .push(FilterCondition::new(field, operator, value));
        }
        self
    }

    /// Apply the `sort` parameter: comma-separated field names, a leading
    /// `-` meaning descending. Without the parameter, results order by
    /// descending creation time.
    #[must_use]
    pub fn sort(mut self) -> Self {
        match self.params.get("sort") {
            Some(raw) => {
                for segment in raw.split(',') {
                    let segment = segment.trim();
                    if segment.is_empty() || segment == "-" {
                        continue;
                    }
                    let key = match segment.strip_prefix('-') {
                        Some(field) => SortKey::desc(field),
                        None => SortKey::asc(segment),
                    };
                    self.query.sort.push(key);
                }
            }
            None => self.query.sort.push(SortKey::desc(CREATED_AT_FIELD)),
        }
        self
    }

    /// Apply the `fields` parameter as an inclusion projection. Without
    /// it, all fields are returned (minus the store's internal revision
    /// field). The identifier field is always included.
    #[must_use]
    pub fn limit_fields(mut self) -> Self {
        if let Some(raw) = self.params.get("fields") {
            let fields: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            if !fields.is_empty() {
                self.query.projection = Projection::Include(fields);
            }
        }
        self
    }

    /// Apply `page` and `limit`: skip `(page - 1) * limit`. Defaults are
    /// page 1 and [`DEFAULT_LIMIT`]; malformed or zero values fall back to
    /// the defaults. No upper bound is enforced on `limit`.
    #[must_use]
    pub fn paginate(mut self) -> Self {
        let page = parse_positive(self.params.get("page")).unwrap_or(1);
        let limit = parse_positive(self.params.get("limit")).unwrap_or(DEFAULT_LIMIT);
        self.query.pagination = Pagination::page(page, limit);
        self
    }

    /// Finish the chain and yield the configured query.
    #[must_use]
    pub fn apply(self) -> QuerySpec {
        self.query
    }
}

/// Split a `field[op]` key into field name and operator. Keys without a
/// recognized bracket suffix are plain equality filters.
fn split_operator(key: &str) -> (&str, FilterOperator) {
    if let Some((field, rest)) = key.split_once('[') {
        if let Some(op) = rest.strip_suffix(']') {
            if let Some(operator) = FilterOperator::from_query_keyword(op) {
                return (field, operator);
            }
        }
    }
    (key, FilterOperator::Equal)
}

fn parse_positive(raw: Option<&String>) -> Option<u64> {
    raw.and_then(|s| s.parse::<u64>().ok()).filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use crate::store::{Filter, OrderDirection};

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_removes_reserved_keys() {
        let params = params(&[
            ("difficulty", "easy"),
            ("page", "2"),
            ("sort", "price"),
            ("limit", "5"),
            ("fields", "name"),
        ]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .filter()
            .apply();
        assert_eq!(query.filter.len(), 1);
        let condition = query.filter.conditions().next().unwrap();
        assert_eq!(condition.field, "difficulty");
        assert_eq!(condition.operator, FilterOperator::Equal);
    }

    #[test]
    fn test_filter_rewrites_bracket_operators() {
        let params = params(&[("price[gte]", "100"), ("duration[lt]", "14")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .filter()
            .apply();
        let wire = query.filter.to_document();
        assert_eq!(wire["price"], serde_json::json!({"$gte": 100.0}));
        assert_eq!(wire["duration"], serde_json::json!({"$lt": 14.0}));
    }

    #[test]
    fn test_filter_unknown_bracket_is_equality_on_raw_key() {
        let params = params(&[("price[weird]", "1")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .filter()
            .apply();
        let condition = query.filter.conditions().next().unwrap();
        assert_eq!(condition.field, "price[weird]");
        assert_eq!(condition.operator, FilterOperator::Equal);
    }

    #[test]
    fn test_filter_passes_unrecognized_fields_through() {
        let params = params(&[("no_such_field", "zzz")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .filter()
            .apply();
        assert_eq!(query.filter.len(), 1);
    }

    #[test]
    fn test_filter_keeps_base_conditions() {
        let base = QuerySpec::filtered(Filter::new().and(FilterCondition::eq("tour", "t1")));
        let params = params(&[("rating[gte]", "4")]);
        let query = QueryTranslator::new(base, &params).filter().apply();
        assert_eq!(query.filter.len(), 2);
    }

    #[test]
    fn test_sort_parses_directions() {
        let params = params(&[("sort", "-price,name")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .sort()
            .apply();
        assert_eq!(query.sort.len(), 2);
        assert_eq!(query.sort[0].field, "price");
        assert_eq!(query.sort[0].direction, OrderDirection::Descending);
        assert_eq!(query.sort[1].field, "name");
        assert_eq!(query.sort[1].direction, OrderDirection::Ascending);
    }

    #[test]
    fn test_sort_default_is_newest_first() {
        let params = QueryParams::new();
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .sort()
            .apply();
        assert_eq!(query.sort.len(), 1);
        assert_eq!(query.sort[0].field, CREATED_AT_FIELD);
        assert_eq!(query.sort[0].direction, OrderDirection::Descending);
    }

    #[test]
    fn test_sort_skips_empty_segments() {
        let params = params(&[("sort", "-price,,name,")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .sort()
            .apply();
        assert_eq!(query.sort.len(), 2);
    }

    #[test]
    fn test_limit_fields_inclusion() {
        let params = params(&[("fields", "name,price")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .limit_fields()
            .apply();
        assert_eq!(
            query.projection,
            Projection::Include(vec!["name".to_string(), "price".to_string()])
        );
    }

    #[test]
    fn test_limit_fields_absent_keeps_all() {
        let params = QueryParams::new();
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .limit_fields()
            .apply();
        assert_eq!(query.projection, Projection::All);
    }

    #[test]
    fn test_paginate_defaults() {
        let params = QueryParams::new();
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .paginate()
            .apply();
        assert_eq!(query.pagination.offset, 0);
        assert_eq!(query.pagination.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_paginate_computes_skip() {
        let params = params(&[("page", "3"), ("limit", "10")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .paginate()
            .apply();
        assert_eq!(query.pagination.offset, 20);
        assert_eq!(query.pagination.limit, 10);
    }

    #[test]
    fn test_paginate_malformed_values_fall_back() {
        let params = params(&[("page", "abc"), ("limit", "-5")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .paginate()
            .apply();
        assert_eq!(query.pagination.offset, 0);
        assert_eq!(query.pagination.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_paginate_zero_values_fall_back() {
        let params = params(&[("page", "0"), ("limit", "0")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .paginate()
            .apply();
        assert_eq!(query.pagination.offset, 0);
        assert_eq!(query.pagination.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_paginate_no_upper_bound_on_limit() {
        let params = params(&[("limit", "1000000")]);
        let query = QueryTranslator::new(QuerySpec::default(), &params)
            .paginate()
            .apply();
        assert_eq!(query.pagination.limit, 1_000_000);
    }

    #[test]
    fn test_translate_runs_full_chain() {
        let params = params(&[
            ("difficulty", "easy"),
            ("price[gte]", "100"),
            ("sort", "-ratings_average"),
            ("limit", "2"),
            ("page", "1"),
        ]);
        let query = QueryTranslator::translate(QuerySpec::default(), &params);
        assert_eq!(query.filter.len(), 2);
        assert_eq!(query.sort[0].field, "ratings_average");
        assert_eq!(query.pagination.limit, 2);
        assert_eq!(query.pagination.offset, 0);
    }

    #[test]
    fn test_translator_does_not_consume_params() {
        let params = params(&[("difficulty", "easy")]);
        let _ = QueryTranslator::translate(QuerySpec::default(), &params);
        // raw parameters are untouched after translation
        assert_eq!(params.get("difficulty").map(String::as_str), Some("easy"));
    }
}
