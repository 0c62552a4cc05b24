use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credit balance held by an authenticated subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub subject_id: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(subject_id: impl Into<String>, balance: i64, now: DateTime<Utc>) -> Self {
        Self {
            subject_id: subject_id.into(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.balance == 0
    }

    pub fn can_afford(&self, amount: i64) -> bool {
        self.balance >= amount
    }
}
