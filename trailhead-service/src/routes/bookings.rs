//! Booking routes
//!
//! Every route requires authentication. Any user can book a tour (the
//! price is copied from the tour at booking time) and list their own
//! bookings; management of the collection is restricted.

use axum::extract::{Json, Query, State};
use axum::middleware;
use axum::routing::get;
use axum::Extension;
use axum::Router;
use serde_json::{json, Value};

use crate::auth::{protect, require_roles, CurrentUser};
use crate::error::{AppError, Result};
use crate::handlers::{crud, Envelope, QueryParams};
use crate::models::booking::CreateBooking;
use crate::models::{tour, Booking};
use crate::state::AppState;

const MANAGER_ROLES: &[&str] = &["admin", "lead-guide"];

/// Assemble the booking router.
pub fn router(state: AppState) -> Router<AppState> {
    let members = Router::new()
        .route("/my-bookings", get(my_bookings))
        .route("/", axum::routing::post(create_booking));

    let managers = Router::new()
        .route("/", get(crud::list_all::<Booking>))
        .route(
            "/{id}",
            get(crud::read_one::<Booking>)
                .patch(crud::update_one::<Booking>)
                .delete(crud::delete_one::<Booking>),
        )
        .route_layer(middleware::from_fn(
            |request: axum::extract::Request, next: middleware::Next| {
                require_roles(MANAGER_ROLES, request, next)
            },
        ));

    members
        .merge(managers)
        .route_layer(middleware::from_fn_with_state(state, protect))
}

/// `POST /` — book a tour for the authenticated user at the tour's
/// current price.
async fn create_booking(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    let Value::Object(mut body) = body else {
        return Err(AppError::BadRequest("Expected a JSON object".to_string()));
    };
    let tour_id = body
        .get("tour")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::BadRequest("Booking must name a tour".to_string()))?
        .to_string();

    let tour = state
        .store()
        .find_by_id(tour::COLLECTION, &tour_id)
        .await?
        .ok_or_else(|| AppError::not_found("Tour", &tour_id))?;
    let price = tour
        .get("price")
        .and_then(Value::as_f64)
        .ok_or_else(|| AppError::Internal("tour has no price".to_string()))?;

    body.insert("user".to_string(), json!(current.id()?));
    body.insert("price".to_string(), json!(price));

    let payload: CreateBooking = serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("Malformed body: {e}")))?;
    let doc = crud::create_doc::<Booking>(state.store(), payload).await?;
    Ok(Envelope::created("document", Value::Object(doc)))
}

/// `GET /my-bookings` — the authenticated user's bookings.
async fn my_bookings(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<QueryParams>,
) -> Result<Envelope> {
    let mut params = params;
    params.insert("user".to_string(), current.id()?.to_string());
    let docs = crud::find_all::<Booking>(state.store(), None, &params).await?;
    Ok(Envelope::list(docs))
}
