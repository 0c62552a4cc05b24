//! Payment provider integration and purchase reconciliation

mod reconciler;
mod signature;
mod stripe;

pub use reconciler::{PaymentReconciler, VerificationOutcome, WebhookOutcome};
pub use signature::{DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER, verify_webhook_signature};
pub use stripe::{DEFAULT_API_BASE, StripeClient};

#[cfg(test)]
pub(crate) use signature::sign;
