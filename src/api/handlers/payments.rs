//! Checkout and payment reconciliation endpoints

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::RequireSubject;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::payment::{SIGNATURE_HEADER, WebhookOutcome};

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    #[serde(alias = "planId")]
    pub plan_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub credits_added: i64,
    pub applied: bool,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/create-checkout-session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    RequireSubject(subject): RequireSubject,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing Origin header"))?;

    let url = state
        .payments
        .create_checkout(subject.as_str(), &body.plan_id, origin)
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// GET /api/verify-payment?session_id=..
pub async fn verify_payment(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let session_id = params.session_id.unwrap_or_default();
    let outcome = state.payments.verify_payment(&session_id).await?;

    Ok(Json(VerifyResponse {
        success: true,
        credits_added: outcome.credits_added,
        applied: outcome.applied,
    }))
}

/// POST /api/stripe/webhook, reading the raw body for signature checks
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match state.payments.handle_webhook(&body, signature).await? {
        WebhookOutcome::Ignored { event_type } => {
            info!(event_type = %event_type, "Ignored webhook event");
        }
        outcome => info!(?outcome, "Processed webhook event"),
    }

    Ok(Json(WebhookAck { received: true }))
}
