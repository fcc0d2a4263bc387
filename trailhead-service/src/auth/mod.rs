//! Authentication and account management
//!
//! Password hashing ([`password`]), token signing ([`token`]), the
//! request-guarding middleware ([`extract`]), and the account endpoints
//! ([`handlers`]).

pub mod extract;
pub mod handlers;
pub mod password;
pub mod token;

pub use extract::{maybe_user, protect, require_roles, CurrentUser};
pub use password::PasswordHasher;
pub use token::{Claims, TokenSigner};
