//! Payment provider contract and checkout types

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

pub const METADATA_SUBJECT_KEY: &str = "subject_id";
pub const METADATA_PLAN_KEY: &str = "plan_id";

/// Hosted checkout the provider should create
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub product_name: String,
    pub unit_amount_cents: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

/// Checkout session as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_SUBJECT_KEY).map(String::as_str)
    }

    pub fn plan_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_PLAN_KEY).map(String::as_str)
    }
}

/// Verified webhook notification
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

impl WebhookEvent {
    /// The checkout session carried by a `checkout.session.completed` event
    pub fn completed_checkout(&self) -> Result<Option<CheckoutSession>, DomainError> {
        if self.event_type != CHECKOUT_SESSION_COMPLETED {
            return Ok(None);
        }

        serde_json::from_value(self.data.object.clone())
            .map(Some)
            .map_err(|e| DomainError::validation(format!("Invalid checkout session payload: {}", e)))
    }
}

/// External payment provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession, DomainError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, DomainError>;
}
