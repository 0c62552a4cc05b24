//! Payments domain

mod plan;
mod provider;

pub use plan::{PLANS, Plan, find_plan};
#[cfg(test)]
pub use provider::MockPaymentProvider;
pub use provider::{
    CHECKOUT_SESSION_COMPLETED, CheckoutRequest, CheckoutSession, METADATA_PLAN_KEY,
    METADATA_SUBJECT_KEY, PaymentProvider, PaymentStatus, WebhookEvent, WebhookEventData,
};
