//! Generic request-handling layer
//!
//! The two reusable pieces every collection shares:
//!
//! - [`QueryTranslator`]: raw query parameters → configured store query
//! - [`crud`]: the handler factory producing the five standard operations
//!   for any [`Resource`] descriptor
//!
//! plus the uniform success [`Envelope`] and the explicit field
//! allow-list helper.

pub mod crud;
pub mod fields;
pub mod query;
pub mod response;

pub use crud::{Payload, PopulateKind, PopulateSpec, Resource};
pub use fields::allow_fields;
pub use query::{QueryParams, QueryTranslator, RESERVED_KEYS};
pub use response::Envelope;
