//! Stripe webhook signature verification
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The signed payload
//! is `"<t>.<raw body>"` under HMAC-SHA256 keyed with the endpoint secret.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::payment::WebhookEvent;
use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Verify the signature over the raw body and parse the event
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> Result<WebhookEvent, DomainError> {
    if secret.is_empty() {
        return Err(DomainError::webhook_signature_invalid(
            "Webhook secret is not configured",
        ));
    }

    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| DomainError::webhook_signature_invalid("Missing timestamp"))?;

    if signatures.is_empty() {
        return Err(DomainError::webhook_signature_invalid("Missing v1 signature"));
    }

    let matched = signatures
        .iter()
        .any(|candidate| signature_matches(secret, timestamp, payload, candidate));

    if !matched {
        return Err(DomainError::webhook_signature_invalid(
            "No signature matches the payload",
        ));
    }

    if (now.timestamp() - timestamp).abs() > tolerance_secs {
        return Err(DomainError::webhook_signature_invalid(
            "Timestamp outside the tolerance zone",
        ));
    }

    serde_json::from_slice(payload)
        .map_err(|e| DomainError::validation(format!("Invalid webhook payload: {}", e)))
}

fn signature_matches(secret: &str, timestamp: i64, payload: &[u8], candidate: &str) -> bool {
    let Ok(expected) = hex::decode(candidate) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);

    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
