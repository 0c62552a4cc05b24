use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Missing project data: {message}")]
    MissingSubjectData { message: String },

    #[error("Rate limit exceeded: {used}/{limit} requests in the last minute")]
    RateLimited { limit: u32, used: u32 },

    #[error("Prompt type '{kind}' is disabled")]
    KindDisabled { kind: String },

    #[error("Not enough credits: balance {balance}, requested {requested}")]
    InsufficientBalance { balance: i64, requested: i64 },

    #[error("AI generation failed: {message}")]
    UpstreamGenerationFailed { message: String },

    #[error("Payment not completed for session '{session_id}'")]
    PaymentNotPaid { session_id: String },

    #[error("Webhook signature verification failed: {message}")]
    WebhookSignatureInvalid { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn missing_subject_data(message: impl Into<String>) -> Self {
        Self::MissingSubjectData {
            message: message.into(),
        }
    }

    pub fn rate_limited(limit: u32, used: u32) -> Self {
        Self::RateLimited { limit, used }
    }

    pub fn kind_disabled(kind: impl Into<String>) -> Self {
        Self::KindDisabled { kind: kind.into() }
    }

    pub fn insufficient_balance(balance: i64, requested: i64) -> Self {
        Self::InsufficientBalance { balance, requested }
    }

    pub fn upstream_generation_failed(message: impl Into<String>) -> Self {
        Self::UpstreamGenerationFailed {
            message: message.into(),
        }
    }

    pub fn payment_not_paid(session_id: impl Into<String>) -> Self {
        Self::PaymentNotPaid {
            session_id: session_id.into(),
        }
    }

    pub fn webhook_signature_invalid(message: impl Into<String>) -> Self {
        Self::WebhookSignatureInvalid {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
