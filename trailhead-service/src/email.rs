//! Outbound email collaborator
//!
//! Delivery is an external concern; the service only needs the narrow
//! [`Mailer`] seam. The default implementation logs instead of sending,
//! which is what development and tests want.

use crate::error::Result;

/// Sends account emails.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Welcome a freshly signed-up user.
    async fn send_welcome(&self, to: &str, name: &str, url: &str) -> Result<()>;

    /// Deliver a password-reset link. The token in the URL is only valid
    /// for a few minutes.
    async fn send_password_reset(&self, to: &str, name: &str, reset_url: &str) -> Result<()>;
}

/// Development mailer: writes the mail to the log.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send_welcome(&self, to: &str, name: &str, url: &str) -> Result<()> {
        tracing::info!(to, name, url, "welcome email");
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, name: &str, reset_url: &str) -> Result<()> {
        tracing::info!(to, name, reset_url, "password reset email");
        Ok(())
    }
}
