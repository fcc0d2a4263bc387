//! Geospatial tour queries
//!
//! The store has no geo index; distances are computed here with the
//! haversine formula over each tour's `start_location.coordinates`
//! (GeoJSON order: `[longitude, latitude]`).

use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::tour::{self, Tour};
use crate::handlers::Resource;
use crate::store::{get_path, Document, DocumentStore, QuerySpec};

const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_PER_MILE: f64 = 1.609344;

/// A point on the globe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// Distance unit accepted by the geo routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Kilometers
    Km,
    /// Miles
    Mi,
}

impl Unit {
    /// Parse the route parameter (`km` or `mi`).
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "km" => Ok(Self::Km),
            "mi" => Ok(Self::Mi),
            _ => Err(AppError::BadRequest(
                "Unit must be either mi or km".to_string(),
            )),
        }
    }

    fn from_km(&self, km: f64) -> f64 {
        match self {
            Self::Km => km,
            Self::Mi => km / KM_PER_MILE,
        }
    }

    fn to_km(&self, value: f64) -> f64 {
        match self {
            Self::Km => value,
            Self::Mi => value * KM_PER_MILE,
        }
    }
}

/// Parse a `lat,lng` route parameter.
pub fn parse_latlng(raw: &str) -> Result<GeoPoint> {
    let error = || {
        AppError::BadRequest(
            "Please provide latitude and longitude in the format lat,lng".to_string(),
        )
    };
    let (lat, lng) = raw.split_once(',').ok_or_else(error)?;
    let lat = lat.trim().parse::<f64>().map_err(|_| error())?;
    let lng = lng.trim().parse::<f64>().map_err(|_| error())?;
    Ok(GeoPoint { lat, lng })
}

/// Great-circle distance between two points in kilometers.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

fn start_point(doc: &Document) -> Option<GeoPoint> {
    let coordinates = get_path(doc, "start_location.coordinates")?.as_array()?;
    let lng = coordinates.first()?.as_f64()?;
    let lat = coordinates.get(1)?.as_f64()?;
    Some(GeoPoint { lat, lng })
}

/// Tours whose start location lies within `distance` (in `unit`) of
/// `center`.
pub async fn tours_within(
    store: &dyn DocumentStore,
    distance: f64,
    center: GeoPoint,
    unit: Unit,
) -> Result<Vec<Document>> {
    let radius_km = unit.to_km(distance);
    let query = QuerySpec {
        filter: Tour::scope_filter(),
        ..QuerySpec::unfiltered()
    };
    let tours = store.find(tour::COLLECTION, &query).await?;
    Ok(tours
        .into_iter()
        .filter(|doc| {
            start_point(doc)
                .map(|point| haversine_km(center, point) <= radius_km)
                .unwrap_or(false)
        })
        .collect())
}

/// Distance from `center` to every tour's start location, ascending,
/// expressed in `unit`.
pub async fn tour_distances(
    store: &dyn DocumentStore,
    center: GeoPoint,
    unit: Unit,
) -> Result<Vec<Value>> {
    let query = QuerySpec {
        filter: Tour::scope_filter(),
        ..QuerySpec::unfiltered()
    };
    let tours = store.find(tour::COLLECTION, &query).await?;

    let mut distances: Vec<(f64, Value)> = tours
        .iter()
        .filter_map(|doc| {
            let point = start_point(doc)?;
            let distance = unit.from_km(haversine_km(center, point));
            let name = doc.get("name").cloned().unwrap_or(Value::Null);
            Some((distance, json!({"name": name, "distance": distance})))
        })
        .collect();
    distances.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(distances.into_iter().map(|(_, entry)| entry).collect())
}
