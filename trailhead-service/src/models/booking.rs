//! Booking model: payloads, constraints, and descriptor
//!
//! A booking records a user purchasing a tour at the tour's price at
//! booking time. Payment-session handling is an external concern; the
//! booking route fills `price` from the tour document before validation.

use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::handlers::{Payload, PopulateKind, PopulateSpec, Resource};
use crate::store::Document;

use super::{tour, user, Violations};

/// Store collection holding bookings.
pub const COLLECTION: &str = "bookings";

static POPULATE: [PopulateSpec; 2] = [
    PopulateSpec {
        field: "tour",
        collection: tour::COLLECTION,
        select: &["name", "slug", "price", "image_cover"],
        kind: PopulateKind::Ref,
    },
    PopulateSpec {
        field: "user",
        collection: user::COLLECTION,
        select: &["name", "email"],
        kind: PopulateKind::Ref,
    },
];

/// Payload for creating a booking.
#[derive(Debug, Deserialize)]
pub struct CreateBooking {
    pub tour: Option<String>,
    pub user: Option<String>,
    pub price: Option<f64>,
    pub paid: Option<bool>,
}

impl Payload for CreateBooking {
    fn into_document(self) -> Result<Document> {
        let mut violations = Violations::new();

        if self.tour.as_deref().map_or(true, str::is_empty) {
            violations.add("tour", "Booking must belong to a tour");
        }
        if self.user.as_deref().map_or(true, str::is_empty) {
            violations.add("user", "Booking must belong to a user");
        }
        match self.price {
            None => violations.add("price", "Booking must have a price"),
            Some(price) if price <= 0.0 => {
                violations.add("price", "Booking price must be positive");
            }
            _ => {}
        }

        let mut doc = Document::new();
        doc.insert("tour".into(), json!(self.tour));
        doc.insert("user".into(), json!(self.user));
        doc.insert("price".into(), json!(self.price));
        doc.insert("paid".into(), json!(self.paid.unwrap_or(true)));

        violations.finish(doc)
    }
}

/// Payload for updating a booking.
#[derive(Debug, Deserialize)]
pub struct UpdateBooking {
    pub price: Option<f64>,
    pub paid: Option<bool>,
}

impl Payload for UpdateBooking {
    fn into_document(self) -> Result<Document> {
        let mut violations = Violations::new();
        let mut doc = Document::new();

        if let Some(price) = self.price {
            if price <= 0.0 {
                violations.add("price", "Booking price must be positive");
            }
            doc.insert("price".into(), json!(price));
        }
        if let Some(paid) = self.paid {
            doc.insert("paid".into(), json!(paid));
        }

        violations.finish(doc)
    }
}

/// Descriptor for the bookings collection.
pub struct Booking;

impl Resource for Booking {
    const COLLECTION: &'static str = COLLECTION;
    const ENTITY: &'static str = "Booking";
    type Create = CreateBooking;
    type Update = UpdateBooking;

    fn populate_one() -> &'static [PopulateSpec] {
        &POPULATE
    }
}
