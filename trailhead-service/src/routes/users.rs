//! User routes
//!
//! Public auth endpoints, the authenticated self-service routes, and the
//! generic account CRUD (which requires authentication; account creation
//! itself only happens through `/signup`).

use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::auth::handlers as auth_handlers;
use crate::auth::protect;
use crate::handlers::crud;
use crate::models::User;
use crate::state::AppState;

/// Assemble the user router.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/signup", post(auth_handlers::signup))
        .route("/login", post(auth_handlers::login))
        .route("/logout", get(auth_handlers::logout))
        .route("/forgot-password", post(auth_handlers::forgot_password))
        .route("/reset-password/{token}", patch(auth_handlers::reset_password));

    let protected = Router::new()
        .route("/me", get(auth_handlers::get_me))
        .route("/update-my-password", patch(auth_handlers::update_password))
        .route("/update-me", patch(auth_handlers::update_me))
        .route("/delete-me", delete(auth_handlers::delete_me))
        .route(
            "/",
            get(crud::list_all::<User>).post(crud::create_one::<User>),
        )
        .route(
            "/{id}",
            get(crud::read_one::<User>)
                .patch(crud::update_one::<User>)
                .delete(crud::delete_one::<User>),
        )
        .route_layer(middleware::from_fn_with_state(state, protect));

    public.merge(protected)
}
