//! Usage event entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a usage event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageEventId(String);

impl UsageEventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID
    pub fn generate() -> Self {
        Self(format!("usage-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UsageEventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UsageEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One generation attempt that reached the cache or the upstream model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    id: UsageEventId,
    pub session_id: String,
    pub project_id: String,
    pub prompt_type: String,
    /// Zero for cache hits
    pub tokens_used: u32,
    pub cached: bool,
    pub created_at: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(
        session_id: impl Into<String>,
        project_id: impl Into<String>,
        prompt_type: impl Into<String>,
        tokens_used: u32,
        cached: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UsageEventId::generate(),
            session_id: session_id.into(),
            project_id: project_id.into(),
            prompt_type: prompt_type.into(),
            tokens_used,
            cached,
            created_at,
        }
    }

    pub fn cache_hit(
        session_id: impl Into<String>,
        project_id: impl Into<String>,
        prompt_type: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(session_id, project_id, prompt_type, 0, true, created_at)
    }

    pub fn generated(
        session_id: impl Into<String>,
        project_id: impl Into<String>,
        prompt_type: impl Into<String>,
        tokens_used: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(session_id, project_id, prompt_type, tokens_used, false, created_at)
    }

    /// Rebuild an event loaded from storage
    pub fn with_id(mut self, id: UsageEventId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &UsageEventId {
        &self.id
    }
}

/// Aggregated usage over a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageAggregate {
    pub total_events: u64,
    pub cached_events: u64,
    pub generated_events: u64,
    pub total_tokens: u64,
}

impl UsageAggregate {
    pub fn add(&mut self, event: &UsageEvent) {
        self.total_events += 1;
        self.total_tokens += u64::from(event.tokens_used);

        if event.cached {
            self.cached_events += 1;
        } else {
            self.generated_events += 1;
        }
    }

    /// Share of events served from cache, 0.0 when empty
    pub fn cache_hit_rate(&self) -> f64 {
        if self.total_events == 0 {
            return 0.0;
        }

        self.cached_events as f64 / self.total_events as f64
    }
}
