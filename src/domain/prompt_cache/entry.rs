use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Generated prompt stored for a (project, prompt type) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub project_id: String,
    pub prompt_type: String,
    pub content: String,
    pub token_estimate: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        project_id: impl Into<String>,
        prompt_type: impl Into<String>,
        content: impl Into<String>,
        token_estimate: u32,
        now: DateTime<Utc>,
        ttl_hours: u32,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            prompt_type: prompt_type.into(),
            content: content.into(),
            token_estimate,
            created_at: now,
            expires_at: now + Duration::hours(i64::from(ttl_hours)),
        }
    }

    /// Live strictly before `expires_at`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
