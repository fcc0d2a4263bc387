//! Router assembly
//!
//! One sub-router per collection plus the server-rendered views, a 404
//! fallback through the centralized error path, and the review router
//! mounted a second time under `/api/v1/tours/{tour_id}/reviews`.

pub mod bookings;
pub mod reviews;
pub mod tours;
pub mod users;
pub mod views;

use axum::extract::OriginalUri;
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete application router.
pub fn app_router(state: AppState) -> Router {
    let tours = tours::router(state.clone())
        .nest("/{id}/reviews", reviews::nested_router(state.clone()));

    Router::new()
        .merge(views::router(state.clone()))
        .nest("/api/v1/tours", tours)
        .nest("/api/v1/users", users::router(state.clone()))
        .nest("/api/v1/reviews", reviews::router(state.clone()))
        .nest("/api/v1/bookings", bookings::router(state.clone()))
        .fallback(route_not_found)
        .with_state(state)
}

/// Unmatched routes surface as explicit 404s.
async fn route_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
