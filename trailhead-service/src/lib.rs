//! # trailhead-service
//!
//! Tour-booking web service: a REST API for browsing tours, managing
//! accounts, posting reviews, and creating bookings, plus server-rendered
//! HTML views, backed by a document store consumed through a narrow
//! trait.
//!
//! The reusable core is the generic request-handling layer in
//! [`handlers`]: a query translator turning raw query strings into
//! filtered/sorted/projected/paginated store queries, and a handler
//! factory producing the five standard collection operations for any
//! resource descriptor. Everything else — models, auth, services,
//! routes, views — is the application built on that core.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use trailhead_service::config::Config;
//! use trailhead_service::email::LogMailer;
//! use trailhead_service::routes::app_router;
//! use trailhead_service::server::Server;
//! use trailhead_service::state::AppState;
//! use trailhead_service::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Arc::new(MemoryStore::connect());
//!     let state = AppState::new(config.clone(), store, Arc::new(LogMailer));
//!     Server::new(config).serve(app_router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod routes;
pub mod seed;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
pub mod views;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
