//! Collection models
//!
//! Each model module defines the create/update payload types with their
//! field constraints, and the [`Resource`](crate::handlers::Resource)
//! descriptor the generic handlers operate on. Validation collects every
//! violated constraint before reporting, so responses can list all of
//! them at once.

pub mod booking;
pub mod review;
pub mod tour;
pub mod user;

pub use booking::Booking;
pub use review::Review;
pub use tour::Tour;
pub use user::User;

use crate::error::{AppError, FieldViolation, Result};
use crate::store::Document;

/// Accumulator for field violations.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldViolation>);

impl Violations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    /// Yield the document if nothing was violated, otherwise the full
    /// violation list.
    pub(crate) fn finish(self, doc: Document) -> Result<Document> {
        if self.0.is_empty() {
            Ok(doc)
        } else {
            Err(AppError::ValidationFailed(self.0))
        }
    }
}
