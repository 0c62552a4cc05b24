//! Credit transaction entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Unique identifier for a credit transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID
    pub fn generate() -> Self {
        Self(format!("txn-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reason a balance changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    SignupBonus,
    Usage,
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignupBonus => "signup_bonus",
            Self::Usage => "usage",
            Self::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup_bonus" => Ok(Self::SignupBonus),
            "usage" => Ok(Self::Usage),
            "purchase" => Ok(Self::Purchase),
            other => Err(DomainError::validation(format!(
                "Unknown transaction kind '{}'",
                other
            ))),
        }
    }
}

/// Immutable ledger entry. Positive amounts grant credits, negative amounts consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    pub subject_id: String,
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub external_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        subject_id: impl Into<String>,
        amount: i64,
        kind: TransactionKind,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            subject_id: subject_id.into(),
            amount,
            kind,
            description: description.into(),
            external_session_id: None,
            created_at,
        }
    }

    pub fn signup_bonus(
        subject_id: impl Into<String>,
        amount: i64,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            subject_id,
            amount,
            TransactionKind::SignupBonus,
            description,
            created_at,
        )
    }

    /// A deduction; `amount` is the positive number of credits consumed.
    pub fn usage(
        subject_id: impl Into<String>,
        amount: i64,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            subject_id,
            -amount,
            TransactionKind::Usage,
            description,
            created_at,
        )
    }

    pub fn purchase(
        subject_id: impl Into<String>,
        credits: i64,
        description: impl Into<String>,
        session_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            subject_id,
            credits,
            TransactionKind::Purchase,
            description,
            created_at,
        )
        .with_external_session_id(session_id)
    }

    /// Rebuild a transaction loaded from storage
    pub fn restore(
        id: TransactionId,
        subject_id: String,
        amount: i64,
        kind: TransactionKind,
        description: String,
        external_session_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject_id,
            amount,
            kind,
            description,
            external_session_id,
            created_at,
        }
    }

    pub fn with_external_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.external_session_id = Some(session_id.into());
        self
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }
}
