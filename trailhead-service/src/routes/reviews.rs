//! Review routes
//!
//! Mounted both at `/api/v1/reviews` and nested under
//! `/api/v1/tours/{id}/reviews`; the nested mount narrows lists to the
//! tour and pre-fills the tour id on create. Every route requires
//! authentication. After each successful write, the owning tour's rating
//! aggregates are recomputed here, at the call site.

use std::collections::HashMap;

use axum::extract::{Json, Path, State};
use axum::middleware;
use axum::routing::get;
use axum::Extension;
use axum::Router;
use serde_json::{json, Value};

use crate::auth::{protect, require_roles, CurrentUser};
use crate::error::{AppError, Result};
use crate::handlers::{crud, Envelope};
use crate::models::review::{self, CreateReview, UpdateReview};
use crate::models::Review;
use crate::services::ratings::recompute_tour_ratings;
use crate::state::AppState;

const AUTHOR_ROLES: &[&str] = &["user"];
const MODERATOR_ROLES: &[&str] = &["user", "admin"];

/// Assemble the flat review router (`/api/v1/reviews`).
pub fn router(state: AppState) -> Router<AppState> {
    let readable = Router::new()
        .route("/", get(crud::list_all::<Review>))
        .route("/{id}", get(crud::read_one::<Review>));

    let moderators = Router::new()
        .route(
            "/{id}",
            axum::routing::patch(update_review).delete(delete_review),
        )
        .route_layer(middleware::from_fn(
            |request: axum::extract::Request, next: middleware::Next| {
                require_roles(MODERATOR_ROLES, request, next)
            },
        ));

    readable
        .merge(author_routes())
        .merge(moderators)
        .route_layer(middleware::from_fn_with_state(state, protect))
}

/// Assemble the nested review router (`/api/v1/tours/{id}/reviews`):
/// list the tour's reviews, create a review for it. The single-review
/// routes live on the flat mount only.
pub fn nested_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(crud::list_all::<Review>))
        .merge(author_routes())
        .route_layer(middleware::from_fn_with_state(state, protect))
}

fn author_routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_review))
        .route_layer(middleware::from_fn(
            |request: axum::extract::Request, next: middleware::Next| {
                require_roles(AUTHOR_ROLES, request, next)
            },
        ))
}

/// `POST /` — create a review. The tour comes from the nested route (or
/// the body on the flat mount); the author is always the authenticated
/// user.
async fn create_review(
    State(state): State<AppState>,
    path: Option<Path<HashMap<String, String>>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    let path = path.map(|Path(p)| p).unwrap_or_default();
    let Value::Object(mut body) = body else {
        return Err(AppError::BadRequest("Expected a JSON object".to_string()));
    };
    if !body.contains_key("tour") {
        if let Some(tour_id) = path.get("id") {
            body.insert("tour".to_string(), json!(tour_id));
        }
    }
    body.insert("user".to_string(), json!(current.id()?));

    let payload: CreateReview = serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("Malformed body: {e}")))?;
    let doc = crud::create_doc::<Review>(state.store(), payload).await?;

    if let Some(tour_id) = doc.get("tour").and_then(Value::as_str) {
        recompute_tour_ratings(state.store(), tour_id).await?;
    }
    Ok(Envelope::created("document", Value::Object(doc)))
}

/// `PATCH /{id}` — update a review, then refresh the tour aggregates.
async fn update_review(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
    Json(payload): Json<UpdateReview>,
) -> Result<Envelope> {
    let id = path
        .get("id")
        .ok_or_else(|| AppError::BadRequest("missing id path parameter".to_string()))?;
    let doc = crud::update_doc::<Review>(state.store(), id, payload).await?;

    if let Some(tour_id) = doc.get("tour").and_then(Value::as_str) {
        recompute_tour_ratings(state.store(), tour_id).await?;
    }
    Ok(Envelope::single("document", Value::Object(doc)))
}

/// `DELETE /{id}` — delete a review, then refresh the tour aggregates.
async fn delete_review(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Envelope> {
    let id = path
        .get("id")
        .ok_or_else(|| AppError::BadRequest("missing id path parameter".to_string()))?;

    // read first so the owning tour is still known after the delete
    let doc = state
        .store()
        .find_by_id(review::COLLECTION, id)
        .await?
        .ok_or_else(|| AppError::not_found("Review", id))?;
    crud::delete_doc::<Review>(state.store(), id).await?;

    if let Some(tour_id) = doc.get("tour").and_then(Value::as_str) {
        recompute_tour_ratings(state.store(), tour_id).await?;
    }
    Ok(Envelope::no_content())
}
