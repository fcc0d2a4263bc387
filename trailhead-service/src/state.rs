//! Application state shared across handlers
//!
//! Collaborators are constructed once by the process entry point and
//! injected here explicitly; handlers reach them through accessors. There
//! are no global connections.

use std::sync::Arc;

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenSigner;
use crate::config::Config;
use crate::email::Mailer;
use crate::store::DocumentStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    passwords: PasswordHasher,
    tokens: TokenSigner,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Assemble state from its collaborators.
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenSigner::new(&config.jwt, config.service.is_development());
        Self {
            config: Arc::new(config),
            store,
            passwords: PasswordHasher::default(),
            tokens,
            mailer,
        }
    }

    /// Service configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The document store handle.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Password hasher.
    #[must_use]
    pub fn passwords(&self) -> &PasswordHasher {
        &self.passwords
    }

    /// Token signer/verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.tokens
    }

    /// Outbound mail collaborator.
    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }
}
