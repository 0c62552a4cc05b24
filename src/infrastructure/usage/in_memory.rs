//! In-memory usage repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::usage::{UsageAggregate, UsageEvent, UsageQuery, UsageRepository};
use crate::domain::DomainError;

/// Append-only event log. Events are never removed.
#[derive(Debug, Default)]
pub struct InMemoryUsageRepository {
    events: RwLock<Vec<UsageEvent>>,
}

impl InMemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn record(&self, event: UsageEvent) -> Result<(), DomainError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn query(&self, query: &UsageQuery) -> Result<Vec<UsageEvent>, DomainError> {
        let events = self.events.read().await;

        let mut results: Vec<_> = events.iter().filter(|e| query.matches(e)).cloned().collect();

        // Newest first
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(results.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, query: &UsageQuery) -> Result<usize, DomainError> {
        let events = self.events.read().await;
        Ok(events.iter().filter(|e| query.matches(e)).count())
    }

    async fn oldest(&self, query: &UsageQuery) -> Result<Option<DateTime<Utc>>, DomainError> {
        let events = self.events.read().await;

        Ok(events
            .iter()
            .filter(|e| query.matches(e))
            .map(|e| e.created_at)
            .min())
    }

    async fn aggregate(&self, query: &UsageQuery) -> Result<UsageAggregate, DomainError> {
        let events = self.events.read().await;

        let mut aggregate = UsageAggregate::default();
        for event in events.iter().filter(|e| query.matches(e)) {
            aggregate.add(event);
        }

        Ok(aggregate)
    }
}
