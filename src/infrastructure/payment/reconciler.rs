//! Payment reconciliation
//!
//! Both the webhook and client verification apply a purchase through
//! `CreditLedger::apply_purchase`, which is idempotent per checkout session.
//! Whichever path arrives first applies it; the other sees `AlreadyApplied`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::signature::verify_webhook_signature;
use crate::domain::payment::{
    CheckoutRequest, CheckoutSession, METADATA_PLAN_KEY, METADATA_SUBJECT_KEY, PaymentProvider,
    find_plan,
};
use crate::domain::{Clock, DomainError};
use crate::infrastructure::credit::{CreditLedger, PurchaseOutcome};
use crate::infrastructure::observability::record_purchase;

const WEBHOOK_DESCRIPTION: &str = "Stripe Checkout purchase";
const VERIFY_DESCRIPTION: &str = "Stripe Checkout purchase (manual verify)";

/// What a verified webhook delivery did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied { session_id: String, credits: i64 },
    AlreadyApplied { session_id: String },
    /// Completed checkout without usable metadata
    Skipped { session_id: String, reason: String },
    /// Event type this service does not act on
    Ignored { event_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub credits_added: i64,
    pub applied: bool,
}

pub struct PaymentReconciler {
    ledger: Arc<CreditLedger>,
    provider: Arc<dyn PaymentProvider>,
    clock: Arc<dyn Clock>,
    webhook_secret: String,
    tolerance_secs: i64,
    currency: String,
}

impl std::fmt::Debug for PaymentReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentReconciler")
            .field("currency", &self.currency)
            .field("tolerance_secs", &self.tolerance_secs)
            .field("webhook_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl PaymentReconciler {
    pub fn new(
        ledger: Arc<CreditLedger>,
        provider: Arc<dyn PaymentProvider>,
        clock: Arc<dyn Clock>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            provider,
            clock,
            webhook_secret: webhook_secret.into(),
            tolerance_secs: super::DEFAULT_TOLERANCE_SECS,
            currency: "usd".to_string(),
        }
    }

    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Start a hosted checkout for a purchasable plan, returning its URL
    pub async fn create_checkout(
        &self,
        subject_id: &str,
        plan_id: &str,
        origin: &str,
    ) -> Result<String, DomainError> {
        let plan = find_plan(plan_id)
            .filter(|plan| plan.is_purchasable())
            .ok_or_else(|| DomainError::not_found("Plan not found"))?;
        let price = plan
            .price_cents
            .ok_or_else(|| DomainError::not_found("Plan not found"))?;

        let origin = origin.trim_end_matches('/');
        let request = CheckoutRequest {
            product_name: format!("{} Credits", plan.credits),
            unit_amount_cents: price,
            currency: self.currency.clone(),
            success_url: format!("{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}", origin),
            cancel_url: format!("{}/pricing", origin),
            metadata: HashMap::from([
                (METADATA_SUBJECT_KEY.to_string(), subject_id.to_string()),
                (METADATA_PLAN_KEY.to_string(), plan.id.to_string()),
            ]),
        };

        let session = self.provider.create_checkout(request).await?;

        info!(subject_id = %subject_id, plan_id = %plan.id, session_id = %session.id, "Checkout session created");

        session
            .url
            .ok_or_else(|| DomainError::provider("stripe", "Checkout session has no URL"))
    }

    /// Verify and apply a webhook delivery. Signature failures mutate nothing.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, DomainError> {
        let event = verify_webhook_signature(
            payload,
            signature_header,
            &self.webhook_secret,
            self.tolerance_secs,
            self.clock.now(),
        )
        .inspect_err(|e| {
            warn!(error = %e, "Rejected webhook delivery");
            record_purchase("webhook", "invalid_signature");
        })?;

        let Some(session) = event.completed_checkout()? else {
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        };

        let Some((subject_id, credits)) = purchase_terms(&session) else {
            warn!(session_id = %session.id, "Completed checkout without a known subject and plan");
            record_purchase("webhook", "skipped");

            return Ok(WebhookOutcome::Skipped {
                reason: "missing or unknown purchase metadata".to_string(),
                session_id: session.id,
            });
        };

        let outcome = self
            .ledger
            .apply_purchase(&subject_id, credits, WEBHOOK_DESCRIPTION, &session.id)
            .await?;

        Ok(self.report("webhook", &subject_id, credits, session.id, outcome))
    }

    /// Client-side confirmation after redirect from checkout
    pub async fn verify_payment(&self, session_id: &str) -> Result<VerificationOutcome, DomainError> {
        if session_id.trim().is_empty() {
            return Err(DomainError::validation("Missing session_id"));
        }

        let session = self.provider.retrieve_session(session_id).await?;

        if !session.is_paid() {
            record_purchase("verify", "not_paid");
            return Err(DomainError::payment_not_paid(session_id));
        }

        let (subject_id, credits) = purchase_terms(&session).ok_or_else(|| {
            DomainError::validation("Checkout session is missing purchase metadata")
        })?;

        let outcome = self
            .ledger
            .apply_purchase(&subject_id, credits, VERIFY_DESCRIPTION, &session.id)
            .await?;

        let applied = outcome.was_applied();
        self.report("verify", &subject_id, credits, session.id, outcome);

        Ok(VerificationOutcome {
            credits_added: credits,
            applied,
        })
    }

    fn report(
        &self,
        source: &'static str,
        subject_id: &str,
        credits: i64,
        session_id: String,
        outcome: PurchaseOutcome,
    ) -> WebhookOutcome {
        match outcome {
            PurchaseOutcome::Applied(account) => {
                record_purchase(source, "applied");
                info!(
                    source,
                    subject_id = %subject_id,
                    session_id = %session_id,
                    credits,
                    balance = account.balance,
                    "Purchase applied"
                );

                WebhookOutcome::Applied {
                    session_id,
                    credits,
                }
            }
            PurchaseOutcome::AlreadyApplied => {
                record_purchase(source, "duplicate");
                info!(source, session_id = %session_id, "Purchase already applied");

                WebhookOutcome::AlreadyApplied { session_id }
            }
        }
    }
}

fn purchase_terms(session: &CheckoutSession) -> Option<(String, i64)> {
    let subject_id = session.subject_id().filter(|s| !s.is_empty())?;
    let plan = find_plan(session.plan_id()?)?;

    Some((subject_id.to_string(), plan.credits))
}
