use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::domain::payment::{CheckoutRequest, CheckoutSession, PaymentProvider};
use crate::domain::DomainError;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

const PROVIDER: &str = "stripe";

/// Stripe Checkout client over the REST API
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.api_base)
    }

    /// Session ids are a single path segment of `[A-Za-z0-9_]`
    fn session_url(&self, session_id: &str) -> Result<String, DomainError> {
        let well_formed = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !well_formed {
            return Err(DomainError::validation("Invalid checkout session id"));
        }

        Ok(format!("{}/{}", self.sessions_url(), session_id))
    }

    async fn parse_session(response: reqwest::Response) -> Result<CheckoutSession, DomainError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(DomainError::not_found("Checkout session not found"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, body),
            ));
        }

        response.json::<CheckoutSession>().await.map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse checkout session: {}", e))
        })
    }
}

/// Stripe's bracketed form encoding for a one-item payment session
fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.unit_amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
    ];

    let mut metadata: Vec<_> = request.metadata.iter().collect();
    metadata.sort();

    for (key, value) in metadata {
        form.push((format!("metadata[{}]", key), value.clone()));
    }

    form
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession, DomainError> {
        let response = self
            .client
            .post(self.sessions_url())
            .bearer_auth(&self.secret_key)
            .form(&checkout_form(&request))
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Request failed: {}", e)))?;

        let session = Self::parse_session(response).await?;
        debug!(session_id = %session.id, "Created checkout session");

        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, DomainError> {
        let response = self
            .client
            .get(self.session_url(session_id)?)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Request failed: {}", e)))?;

        Self::parse_session(response).await
    }
}
