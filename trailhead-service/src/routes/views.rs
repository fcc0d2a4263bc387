//! Server-rendered page routes

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::middleware;
use axum::routing::get;
use axum::Extension;
use axum::Router;

use crate::auth::{maybe_user, protect, CurrentUser};
use crate::error::AppError;
use crate::handlers::{crud, QueryParams, Resource};
use crate::models::tour::{self, Tour};
use crate::models::Review;
use crate::state::AppState;
use crate::store::{FilterCondition, Pagination, QuerySpec};
use crate::views::{
    AccountPage, LoginPage, OverviewPage, PageError, ReviewItem, TourDetail, TourPage, UserView,
};

/// Assemble the view router.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(overview))
        .route("/tour/{slug}", get(tour_page))
        .route("/login", get(login_page));

    let account = Router::new()
        .route("/me", get(account_page))
        .route_layer(middleware::from_fn_with_state(state, protect));

    public.merge(account)
}

async fn header_user(state: &AppState, headers: &HeaderMap) -> Option<UserView> {
    maybe_user(state, headers)
        .await
        .map(|doc| UserView::from_doc(&doc))
}

/// `GET /` — all tours.
async fn overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<OverviewPage, PageError> {
    let user = header_user(&state, &headers).await;
    let docs = crud::find_all::<Tour>(state.store(), None, &QueryParams::new()).await?;
    Ok(OverviewPage {
        user,
        tours: docs
            .iter()
            .map(crate::views::TourCard::from_doc)
            .collect(),
    })
}

/// `GET /tour/{slug}` — tour detail with guides and reviews.
async fn tour_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<TourPage, PageError> {
    let user = header_user(&state, &headers).await;

    let mut filter = Tour::scope_filter();
    filter.push(FilterCondition::eq("slug", slug.clone()));
    let query = QuerySpec {
        filter,
        pagination: Pagination::new(0, 1),
        ..QuerySpec::default()
    };
    let doc = state
        .store()
        .find(tour::COLLECTION, &query)
        .await
        .map_err(AppError::from)?
        .pop()
        .ok_or_else(|| AppError::not_found("Tour", &slug))?;

    // re-read through the generic path so guides are expanded, then pull
    // the reviews through their own list operation so authors come back
    // expanded too
    let id = crate::store::doc_id(&doc)
        .ok_or_else(|| AppError::Internal("stored tour has no id".to_string()))?
        .to_string();
    let expanded = crud::find_one::<Tour>(state.store(), &id).await?;
    let reviews =
        crud::find_all::<Review>(state.store(), Some(&id), &QueryParams::new()).await?;

    let mut tour = TourDetail::from_doc(&expanded);
    tour.reviews = reviews.iter().map(ReviewItem::from_doc).collect();

    Ok(TourPage { user, tour })
}

/// `GET /login`
async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<LoginPage, PageError> {
    let user = header_user(&state, &headers).await;
    Ok(LoginPage { user })
}

/// `GET /me` (authenticated)
async fn account_page(
    Extension(current): Extension<CurrentUser>,
) -> Result<AccountPage, PageError> {
    let account = UserView::from_doc(&current.0);
    Ok(AccountPage {
        user: Some(account.clone()),
        account,
    })
}
