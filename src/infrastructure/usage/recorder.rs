//! Usage recorder service

use std::sync::Arc;

use tracing::debug;

use crate::domain::usage::{UsageAggregate, UsageEvent, UsageQuery, UsageRepository};
use crate::domain::{Clock, DomainError};

/// Parameters for recording a generation attempt
#[derive(Debug, Clone)]
pub struct RecordUsageParams {
    pub session_id: String,
    pub project_id: String,
    pub prompt_type: String,
    pub tokens_used: u32,
    pub cached: bool,
}

impl RecordUsageParams {
    pub fn cache_hit(
        session_id: impl Into<String>,
        project_id: impl Into<String>,
        prompt_type: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            project_id: project_id.into(),
            prompt_type: prompt_type.into(),
            tokens_used: 0,
            cached: true,
        }
    }

    pub fn generated(
        session_id: impl Into<String>,
        project_id: impl Into<String>,
        prompt_type: impl Into<String>,
        tokens_used: u32,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            project_id: project_id.into(),
            prompt_type: prompt_type.into(),
            tokens_used,
            cached: false,
        }
    }
}

#[derive(Debug)]
pub struct UsageRecorder {
    repository: Arc<dyn UsageRepository>,
    clock: Arc<dyn Clock>,
}

impl UsageRecorder {
    pub fn new(repository: Arc<dyn UsageRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Append an event stamped with the current time
    pub async fn record(&self, params: RecordUsageParams) -> Result<UsageEvent, DomainError> {
        let event = UsageEvent::new(
            params.session_id,
            params.project_id,
            params.prompt_type,
            params.tokens_used,
            params.cached,
            self.clock.now(),
        );

        self.repository.record(event.clone()).await?;

        debug!(
            session_id = %event.session_id,
            prompt_type = %event.prompt_type,
            cached = event.cached,
            tokens = event.tokens_used,
            "Recorded usage"
        );

        Ok(event)
    }

    pub async fn query(&self, query: &UsageQuery) -> Result<Vec<UsageEvent>, DomainError> {
        self.repository.query(query).await
    }

    pub async fn aggregate(&self, query: &UsageQuery) -> Result<UsageAggregate, DomainError> {
        self.repository.aggregate(query).await
    }

    pub(crate) fn repository(&self) -> &Arc<dyn UsageRepository> {
        &self.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::mock::ManualClock;
    use crate::infrastructure::usage::InMemoryUsageRepository;

    #[tokio::test]
    async fn test_record_stamps_clock_time() {
        let clock = Arc::new(ManualClock::fixed());
        let recorder = UsageRecorder::new(Arc::new(InMemoryUsageRepository::default()), clock.clone());

        let event = recorder
            .record(RecordUsageParams::generated("s1", "p1", "architecture", 42))
            .await
            .unwrap();

        assert_eq!(event.created_at, clock.now());
        assert!(!event.cached);

        let aggregate = recorder
            .aggregate(&UsageQuery::new().with_session("s1"))
            .await
            .unwrap();
        assert_eq!(aggregate.total_tokens, 42);
    }
}
