//! Tour routes
//!
//! Public browsing (list, read, aliases, stats, geo queries), with
//! mutations restricted to tour managers. The review router is nested
//! under `/{id}/reviews` by the parent module.

use axum::extract::{Path, Query, State};
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use serde_json::Value;

use crate::auth::{protect, require_roles};
use crate::error::Result;
use crate::handlers::{crud, Envelope, QueryParams};
use crate::models::Tour;
use crate::services::{geo, stats};
use crate::state::AppState;

const MANAGER_ROLES: &[&str] = &["admin", "lead-guide"];
const PLANNING_ROLES: &[&str] = &["admin", "lead-guide", "guide"];

/// Assemble the tour router.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/top-5-cheap", get(top_five_cheap))
        .route("/tour-stats", get(tour_stats))
        .route(
            "/tours-within/{distance}/center/{latlng}/unit/{unit}",
            get(tours_within),
        )
        .route("/distances/{latlng}/unit/{unit}", get(distances))
        .route("/", get(crud::list_all::<Tour>))
        .route("/{id}", get(crud::read_one::<Tour>));

    let planning = Router::new()
        .route("/monthly-plan/{year}", get(monthly_plan))
        .route_layer(middleware::from_fn(
            |request: axum::extract::Request, next: middleware::Next| {
                require_roles(PLANNING_ROLES, request, next)
            },
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), protect));

    let managed = Router::new()
        .route("/", post(crud::create_one::<Tour>))
        .route(
            "/{id}",
            patch(crud::update_one::<Tour>).delete(crud::delete_one::<Tour>),
        )
        .route_layer(middleware::from_fn(
            |request: axum::extract::Request, next: middleware::Next| {
                require_roles(MANAGER_ROLES, request, next)
            },
        ))
        .route_layer(middleware::from_fn_with_state(state, protect));

    public.merge(planning).merge(managed)
}

/// `GET /top-5-cheap` — canned list: best rated first, price as
/// tie-break, trimmed field set. Presets override whatever the caller
/// sent for the same keys.
async fn top_five_cheap(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Envelope> {
    let mut params = params;
    params.insert("limit".to_string(), "5".to_string());
    params.insert("sort".to_string(), "-ratings_average,price".to_string());
    params.insert(
        "fields".to_string(),
        "name,price,ratings_average,summary,difficulty".to_string(),
    );
    let docs = crud::find_all::<Tour>(state.store(), None, &params).await?;
    Ok(Envelope::list(docs))
}

/// `GET /tour-stats`
async fn tour_stats(State(state): State<AppState>) -> Result<Envelope> {
    let stats = stats::tour_stats(state.store()).await?;
    Ok(Envelope::single("stats", Value::Array(stats)))
}

/// `GET /monthly-plan/{year}` (planning roles)
async fn monthly_plan(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Envelope> {
    let plan = stats::monthly_plan(state.store(), year).await?;
    Ok(Envelope::single("plan", Value::Array(plan)))
}

/// `GET /tours-within/{distance}/center/{latlng}/unit/{unit}`
async fn tours_within(
    State(state): State<AppState>,
    Path((distance, latlng, unit)): Path<(f64, String, String)>,
) -> Result<Envelope> {
    let center = geo::parse_latlng(&latlng)?;
    let unit = geo::Unit::parse(&unit)?;
    let docs = geo::tours_within(state.store(), distance, center, unit).await?;
    Ok(Envelope::list(docs))
}

/// `GET /distances/{latlng}/unit/{unit}`
async fn distances(
    State(state): State<AppState>,
    Path((latlng, unit)): Path<(String, String)>,
) -> Result<Envelope> {
    let center = geo::parse_latlng(&latlng)?;
    let unit = geo::Unit::parse(&unit)?;
    let distances = geo::tour_distances(state.store(), center, unit).await?;
    Ok(Envelope::single("distances", Value::Array(distances)))
}
