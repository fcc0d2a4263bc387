//! Tour statistics
//!
//! Aggregations the original data layer computed in its query engine,
//! expressed as explicit service functions over fetched documents.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::Result;
use crate::models::tour;
use crate::store::{DocumentStore, Filter, FilterCondition, QuerySpec};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-difficulty statistics over well-rated tours (average rating at
/// least 4.5): counts, rating totals, and price spread, ordered by
/// average price ascending.
pub async fn tour_stats(store: &dyn DocumentStore) -> Result<Vec<Value>> {
    let query = QuerySpec::filtered(
        Filter::new().and(FilterCondition::gte("ratings_average", 4.5)),
    );
    let tours = store.find(tour::COLLECTION, &query).await?;

    struct Group {
        num_tours: u64,
        num_ratings: f64,
        rating_sum: f64,
        price_sum: f64,
        min_price: f64,
        max_price: f64,
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for doc in &tours {
        let difficulty = doc
            .get("difficulty")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let rating = doc
            .get("ratings_average")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let quantity = doc
            .get("ratings_quantity")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let price = doc.get("price").and_then(Value::as_f64).unwrap_or(0.0);

        let group = groups.entry(difficulty).or_insert(Group {
            num_tours: 0,
            num_ratings: 0.0,
            rating_sum: 0.0,
            price_sum: 0.0,
            min_price: f64::INFINITY,
            max_price: f64::NEG_INFINITY,
        });
        group.num_tours += 1;
        group.num_ratings += quantity;
        group.rating_sum += rating;
        group.price_sum += price;
        group.min_price = group.min_price.min(price);
        group.max_price = group.max_price.max(price);
    }

    let mut stats: Vec<Value> = groups
        .into_iter()
        .map(|(difficulty, group)| {
            let n = group.num_tours as f64;
            json!({
                "difficulty": difficulty,
                "num_tours": group.num_tours,
                "num_ratings": group.num_ratings,
                "avg_rating": round1(group.rating_sum / n),
                "avg_price": round1(group.price_sum / n),
                "min_price": group.min_price,
                "max_price": group.max_price,
            })
        })
        .collect();
    stats.sort_by(|a, b| {
        let left = a["avg_price"].as_f64().unwrap_or(0.0);
        let right = b["avg_price"].as_f64().unwrap_or(0.0);
        left.total_cmp(&right)
    });
    Ok(stats)
}

/// Monthly plan for a year: how many tours start in each month (a tour
/// with several start dates counts once per date), with their names.
/// Busiest months capped at twelve entries, ordered by month.
pub async fn monthly_plan(store: &dyn DocumentStore, year: i32) -> Result<Vec<Value>> {
    let tours = store
        .find(tour::COLLECTION, &QuerySpec::unfiltered())
        .await?;

    let mut months: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for doc in &tours {
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(dates) = doc.get("start_dates").and_then(Value::as_array) else {
            continue;
        };
        for date in dates.iter().filter_map(Value::as_str) {
            let Some((date_year, month)) = parse_year_month(date) else {
                continue;
            };
            if date_year == year {
                months.entry(month).or_default().push(name.clone());
            }
        }
    }

    Ok(months
        .into_iter()
        .take(12)
        .map(|(month, tours)| {
            json!({
                "month": month,
                "num_tour_starts": tours.len(),
                "tours": tours,
            })
        })
        .collect())
}

/// Extract year and month from a date string (`YYYY-MM-...`).
fn parse_year_month(raw: &str) -> Option<(i32, u32)> {
    let mut parts = raw.split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}
