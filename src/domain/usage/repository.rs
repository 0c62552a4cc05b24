//! Usage repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::{UsageAggregate, UsageEvent};
use crate::domain::DomainError;

/// Query parameters for usage events
#[derive(Debug, Clone, Default)]
pub struct UsageQuery {
    /// Filter by client session
    pub session_id: Option<String>,
    /// Filter by prompt type
    pub prompt_type: Option<String>,
    /// Only cached (`Some(true)`) or only generated (`Some(false)`) events
    pub cached: Option<bool>,
    /// Start of the time range (inclusive)
    pub since: Option<DateTime<Utc>>,
    /// End of the time range (inclusive)
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl UsageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_prompt_type(mut self, prompt_type: impl Into<String>) -> Self {
        self.prompt_type = Some(prompt_type.into());
        self
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = Some(cached);
        self
    }

    pub fn with_time_range(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether an event satisfies every filter except pagination
    pub fn matches(&self, event: &UsageEvent) -> bool {
        if let Some(ref session_id) = self.session_id {
            if &event.session_id != session_id {
                return false;
            }
        }

        if let Some(ref prompt_type) = self.prompt_type {
            if &event.prompt_type != prompt_type {
                return false;
            }
        }

        if let Some(cached) = self.cached {
            if event.cached != cached {
                return false;
            }
        }

        if let Some(since) = self.since {
            if event.created_at < since {
                return false;
            }
        }

        if let Some(until) = self.until {
            if event.created_at > until {
                return false;
            }
        }

        true
    }
}

/// Append-only store of usage events
#[async_trait]
pub trait UsageRepository: Send + Sync + Debug {
    /// Append an event
    async fn record(&self, event: UsageEvent) -> Result<(), DomainError>;

    /// Query events, newest first
    async fn query(&self, query: &UsageQuery) -> Result<Vec<UsageEvent>, DomainError>;

    /// Count events matching the query (pagination ignored)
    async fn count(&self, query: &UsageQuery) -> Result<usize, DomainError>;

    /// Timestamp of the oldest matching event
    async fn oldest(&self, query: &UsageQuery) -> Result<Option<DateTime<Utc>>, DomainError>;

    /// Aggregate matching events (pagination ignored)
    async fn aggregate(&self, query: &UsageQuery) -> Result<UsageAggregate, DomainError>;
}
