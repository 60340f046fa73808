//! Outbound mail. Delivery is best-effort: callers log failures and carry
//! on, since the account record is the source of truth and signup can be
//! retried to resend a code.

use anyhow::Result;

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Writes outbound messages to the log instead of a wire. Stands in for a
/// real delivery backend in development and tests.
pub struct LogMailer {
    from_address: String,
}

impl LogMailer {
    #[must_use]
    pub const fn new(from_address: String) -> Self {
        Self { from_address }
    }
}

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!(
            from = %self.from_address,
            to = %to,
            subject = %subject,
            "Outbound mail: {body}"
        );
        Ok(())
    }
}
