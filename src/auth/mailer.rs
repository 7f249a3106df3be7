//! Outbound notification abstraction.
//!
//! Mail is fire-and-report: the lifecycle service persists state first, then
//! attempts delivery and surfaces the outcome to the caller. A failed send
//! never rolls back durable state.

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Mail delivery boundary consumed by the lifecycle service.
pub trait Mailer: Send + Sync {
    /// Deliver a message or report a `DeliveryError`.
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Local dev mailer that logs instead of delivering.
///
/// The body is not logged: reset links carry raw single-use tokens.
#[derive(Clone, Debug)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        info!(
            to_email = %to,
            subject = %subject,
            body_bytes = body.len(),
            "mail send stub"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mailer_always_succeeds() {
        let result = LogMailer.send("a@example.com", "Subject", "Body");
        assert!(result.is_ok());
    }
}
