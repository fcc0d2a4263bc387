//! Process entry point
//!
//! Owns the explicit lifecycle: load configuration, initialize tracing,
//! connect the store (seeding it if configured), serve, disconnect.

use std::sync::Arc;

use trailhead_service::config::Config;
use trailhead_service::email::LogMailer;
use trailhead_service::error::{set_error_mode, ErrorMode};
use trailhead_service::observability::init_tracing;
use trailhead_service::routes::app_router;
use trailhead_service::server::Server;
use trailhead_service::state::AppState;
use trailhead_service::store::MemoryStore;
use trailhead_service::{seed, store::DocumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;
    set_error_mode(if config.service.is_development() {
        ErrorMode::Development
    } else {
        ErrorMode::Production
    });

    let store = Arc::new(MemoryStore::connect());
    if let Some(path) = &config.store.seed_file {
        seed::load(store.as_ref(), path).await?;
    }

    let state = AppState::new(
        config.clone(),
        store.clone() as Arc<dyn DocumentStore>,
        Arc::new(LogMailer),
    );
    let app = app_router(state);

    Server::new(config).serve(app).await?;

    store.shutdown();
    Ok(())
}
