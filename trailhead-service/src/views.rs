//! Server-rendered pages
//!
//! Askama templates and the flat view structs they render. Documents are
//! converted to view structs here so templates never touch raw JSON.

use askama::Template;
use askama_web::WebTemplate;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::Value;

use crate::error::{error_mode, AppError};
use crate::store::Document;

fn text(doc: &Document, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number(doc: &Document, field: &str) -> f64 {
    doc.get(field).and_then(Value::as_f64).unwrap_or_default()
}

/// Minimal user representation for page headers and the account page.
#[derive(Debug, Clone)]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
}

impl UserView {
    /// Build from a user document.
    #[must_use]
    pub fn from_doc(doc: &Document) -> Self {
        Self {
            name: text(doc, "name"),
            email: text(doc, "email"),
            photo: text(doc, "photo"),
            role: text(doc, "role"),
        }
    }
}

/// Tour summary rendered on the overview page.
#[derive(Debug, Clone)]
pub struct TourCard {
    pub name: String,
    pub slug: String,
    pub summary: String,
    pub difficulty: String,
    pub duration: f64,
    pub price: f64,
    pub ratings_average: f64,
    pub ratings_quantity: u64,
    pub image_cover: String,
}

impl TourCard {
    /// Build from a tour document.
    #[must_use]
    pub fn from_doc(doc: &Document) -> Self {
        Self {
            name: text(doc, "name"),
            slug: text(doc, "slug"),
            summary: text(doc, "summary"),
            difficulty: text(doc, "difficulty"),
            duration: number(doc, "duration"),
            price: number(doc, "price"),
            ratings_average: number(doc, "ratings_average"),
            ratings_quantity: doc
                .get("ratings_quantity")
                .and_then(Value::as_u64)
                .unwrap_or_default(),
            image_cover: text(doc, "image_cover"),
        }
    }
}

/// Guide entry on the tour detail page.
#[derive(Debug, Clone)]
pub struct GuideView {
    pub name: String,
    pub role: String,
}

/// Review entry on the tour detail page.
#[derive(Debug, Clone)]
pub struct ReviewItem {
    pub author: String,
    pub text: String,
    pub rating: f64,
}

impl ReviewItem {
    /// Build from a review document whose `user` field has been expanded.
    #[must_use]
    pub fn from_doc(doc: &Document) -> Self {
        Self {
            author: doc
                .get("user")
                .and_then(Value::as_object)
                .map(|user| text(user, "name"))
                .unwrap_or_default(),
            text: text(doc, "review"),
            rating: number(doc, "rating"),
        }
    }
}

/// Full tour for the detail page: card fields plus description, guides,
/// and reviews (both expanded by the read operation).
#[derive(Debug, Clone)]
pub struct TourDetail {
    pub card: TourCard,
    pub description: String,
    pub guides: Vec<GuideView>,
    pub reviews: Vec<ReviewItem>,
}

impl TourDetail {
    /// Build from an expanded tour document.
    #[must_use]
    pub fn from_doc(doc: &Document) -> Self {
        let guides = doc
            .get("guides")
            .and_then(Value::as_array)
            .map(|guides| {
                guides
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|guide| GuideView {
                        name: text(guide, "name"),
                        role: text(guide, "role"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let reviews = doc
            .get("reviews")
            .and_then(Value::as_array)
            .map(|reviews| {
                reviews
                    .iter()
                    .filter_map(Value::as_object)
                    .map(ReviewItem::from_doc)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            card: TourCard::from_doc(doc),
            description: text(doc, "description"),
            guides,
            reviews,
        }
    }
}

/// `GET /`
#[derive(Template, WebTemplate)]
#[template(path = "overview.html")]
pub struct OverviewPage {
    pub user: Option<UserView>,
    pub tours: Vec<TourCard>,
}

/// `GET /tour/{slug}`
#[derive(Template, WebTemplate)]
#[template(path = "tour.html")]
pub struct TourPage {
    pub user: Option<UserView>,
    pub tour: TourDetail,
}

/// `GET /login`
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub user: Option<UserView>,
}

/// `GET /me`
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountPage {
    pub user: Option<UserView>,
    pub account: UserView,
}

/// Rendered error page.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub user: Option<UserView>,
    pub message: String,
}

/// Error wrapper for view handlers: same taxonomy, HTML rendering.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let message = self.0.body(error_mode()).message;
        let page = ErrorPage {
            user: None,
            message,
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("error page failed to render: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn test_tour_card_from_doc() {
        let card = TourCard::from_doc(&doc(json!({
            "name": "The Forest Hiker",
            "slug": "the-forest-hiker",
            "price": 397.0,
            "ratings_average": 4.7,
            "ratings_quantity": 12,
        })));
        assert_eq!(card.name, "The Forest Hiker");
        assert_eq!(card.price, 397.0);
        assert_eq!(card.ratings_quantity, 12);
        // missing fields default rather than panic
        assert_eq!(card.summary, "");
    }

    #[test]
    fn test_tour_detail_reads_expansions() {
        let detail = TourDetail::from_doc(&doc(json!({
            "name": "The Forest Hiker",
            "description": "Long walk",
            "guides": [{"name": "Kate", "role": "lead-guide"}],
            "reviews": [
                {"review": "Great", "rating": 5.0, "user": {"name": "Alice"}}
            ],
        })));
        assert_eq!(detail.guides.len(), 1);
        assert_eq!(detail.guides[0].name, "Kate");
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.reviews[0].author, "Alice");
    }

    #[test]
    fn test_overview_page_renders() {
        let page = OverviewPage {
            user: None,
            tours: vec![TourCard::from_doc(&doc(json!({
                "name": "The Forest Hiker",
                "slug": "the-forest-hiker",
                "summary": "A walk",
                "price": 397.0,
            })))],
        };
        let html = page.render().unwrap();
        assert!(html.contains("The Forest Hiker"));
        assert!(html.contains("/tour/the-forest-hiker"));
        assert!(html.contains("Log in"));
    }

    #[test]
    fn test_error_page_renders_message() {
        let page = ErrorPage {
            user: None,
            message: "No Tour found with that ID".to_string(),
        };
        let html = page.render().unwrap();
        assert!(html.contains("No Tour found with that ID"));
    }
}
