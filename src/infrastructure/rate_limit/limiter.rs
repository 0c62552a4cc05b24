//! Sliding window rate limiter
//!
//! Counts are replayed from the usage log on every call, so the window is
//! exact rather than bucketed. Two counts are derived from the same window:
//!
//! - `admission_count` includes cached and generated events and decides
//!   whether a new generation may reach the upstream model.
//! - `display_count` includes only generated events and backs the
//!   client-facing quota view.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::rate_limit::{
    Admission, KNOWN_PROMPT_TYPES, RateLimitConfig, RateLimitConfigRepository, RateLimitStatus,
    WINDOW_SECONDS,
};
use crate::domain::usage::{UsageQuery, UsageRepository};
use crate::domain::{Clock, DomainError};

#[derive(Debug)]
pub struct RateLimiter {
    configs: Arc<dyn RateLimitConfigRepository>,
    usage: Arc<dyn UsageRepository>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(
        configs: Arc<dyn RateLimitConfigRepository>,
        usage: Arc<dyn UsageRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            configs,
            usage,
            clock,
        }
    }

    /// Administered config for the prompt type, or the defaults
    pub async fn config_for(&self, prompt_type: &str) -> Result<RateLimitConfig, DomainError> {
        Ok(self
            .configs
            .get(prompt_type)
            .await?
            .unwrap_or_else(|| RateLimitConfig::new(prompt_type)))
    }

    /// Decide whether one more generation is allowed for (session, prompt type)
    pub async fn check_admission(
        &self,
        session_id: &str,
        prompt_type: &str,
    ) -> Result<Admission, DomainError> {
        let config = self.config_for(prompt_type).await?;

        if !config.is_enabled {
            return Ok(Admission::Disabled);
        }

        let now = self.clock.now();
        let query = window_query(session_id, prompt_type, now);
        let admission_count = self.usage.count(&query).await? as u32;
        let limit = config.requests_per_minute;

        if admission_count >= limit {
            let oldest = self.usage.oldest(&query).await?;
            let reset_in_seconds = reset_in_seconds(oldest, now);

            debug!(
                session_id = %session_id,
                prompt_type = %prompt_type,
                used = admission_count,
                limit,
                "Rate limit reached"
            );

            return Ok(Admission::Limited {
                used: admission_count,
                limit,
                reset_in_seconds,
            });
        }

        Ok(Admission::Allowed {
            used: admission_count,
            limit,
        })
    }

    /// Quota view for one prompt type, counting only generated events
    pub async fn status(
        &self,
        session_id: &str,
        prompt_type: &str,
    ) -> Result<RateLimitStatus, DomainError> {
        let config = self.config_for(prompt_type).await?;
        self.status_with_config(session_id, &config).await
    }

    /// Quota views for every known or administered prompt type
    pub async fn status_all(&self, session_id: &str) -> Result<Vec<RateLimitStatus>, DomainError> {
        let mut configs: Vec<RateLimitConfig> = Vec::new();

        for prompt_type in KNOWN_PROMPT_TYPES {
            configs.push(self.config_for(prompt_type).await?);
        }

        for config in self.configs.list().await? {
            if !configs.iter().any(|c| c.prompt_type == config.prompt_type) {
                configs.push(config);
            }
        }

        let mut statuses = Vec::with_capacity(configs.len());
        for config in &configs {
            statuses.push(self.status_with_config(session_id, config).await?);
        }

        Ok(statuses)
    }

    async fn status_with_config(
        &self,
        session_id: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitStatus, DomainError> {
        let now = self.clock.now();
        let query = window_query(session_id, &config.prompt_type, now).with_cached(false);

        let display_count = self.usage.count(&query).await? as u32;
        let reset = if display_count >= config.requests_per_minute {
            Some(reset_in_seconds(self.usage.oldest(&query).await?, now))
        } else {
            None
        };

        Ok(RateLimitStatus::new(
            &config.prompt_type,
            display_count,
            config.requests_per_minute,
            reset,
            config.is_enabled,
        ))
    }
}

fn window_query(session_id: &str, prompt_type: &str, now: DateTime<Utc>) -> UsageQuery {
    UsageQuery::new()
        .with_session(session_id)
        .with_prompt_type(prompt_type)
        .with_time_range(now - Duration::seconds(WINDOW_SECONDS), now)
}

/// Whole seconds until the oldest in-window event ages out, rounded up
fn reset_in_seconds(oldest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    let Some(oldest) = oldest else {
        return WINDOW_SECONDS as u64;
    };

    let remaining_ms = (oldest + Duration::seconds(WINDOW_SECONDS) - now).num_milliseconds();

    if remaining_ms <= 0 {
        return 0;
    }

    ((remaining_ms + 999) / 1000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::mock::ManualClock;
    use crate::domain::usage::UsageEvent;
    use crate::infrastructure::rate_limit::InMemoryRateLimitConfigRepository;
    use crate::infrastructure::usage::InMemoryUsageRepository;

    struct Fixture {
        limiter: RateLimiter,
        usage: Arc<InMemoryUsageRepository>,
        clock: Arc<ManualClock>,
    }

    fn fixture(configs: Vec<RateLimitConfig>) -> Fixture {
        let clock = Arc::new(ManualClock::fixed());
        let usage = Arc::new(InMemoryUsageRepository::default());
        let limiter = RateLimiter::new(
            Arc::new(InMemoryRateLimitConfigRepository::with_configs(configs)),
            usage.clone(),
            clock.clone(),
        );

        Fixture {
            limiter,
            usage,
            clock,
        }
    }

    impl Fixture {
        async fn generated(&self, prompt_type: &str) {
            self.usage
                .record(UsageEvent::generated("s1", "p1", prompt_type, 10, self.clock.now()))
                .await
                .unwrap();
        }

        async fn cache_hit(&self, prompt_type: &str) {
            self.usage
                .record(UsageEvent::cache_hit("s1", "p1", prompt_type, self.clock.now()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_defaults_apply_without_config() {
        let f = fixture(vec![]);

        let admission = f.limiter.check_admission("s1", "architecture").await.unwrap();
        assert_eq!(admission, Admission::Allowed { used: 0, limit: 10 });
    }

    #[tokio::test]
    async fn test_denies_at_limit_and_recovers_after_window() {
        let f = fixture(vec![
            RateLimitConfig::new("architecture").with_requests_per_minute(3),
        ]);

        f.generated("architecture").await;
        f.clock.advance(Duration::seconds(10));
        f.generated("architecture").await;
        f.generated("architecture").await;

        let admission = f.limiter.check_admission("s1", "architecture").await.unwrap();
        assert_eq!(
            admission,
            Admission::Limited {
                used: 3,
                limit: 3,
                reset_in_seconds: 50
            }
        );

        // Oldest event leaves the window
        f.clock.advance(Duration::seconds(51));
        let admission = f.limiter.check_admission("s1", "architecture").await.unwrap();
        assert_eq!(admission, Admission::Allowed { used: 2, limit: 3 });
    }

    #[tokio::test]
    async fn test_disabled_prompt_type() {
        let f = fixture(vec![RateLimitConfig::new("database").disabled()]);

        let admission = f.limiter.check_admission("s1", "database").await.unwrap();
        assert_eq!(admission, Admission::Disabled);
    }

    #[tokio::test]
    async fn test_admission_counts_cache_hits_but_display_does_not() {
        let f = fixture(vec![
            RateLimitConfig::new("architecture").with_requests_per_minute(2),
        ]);

        f.cache_hit("architecture").await;
        f.cache_hit("architecture").await;

        let admission = f.limiter.check_admission("s1", "architecture").await.unwrap();
        assert!(!admission.is_allowed());

        let status = f.limiter.status("s1", "architecture").await.unwrap();
        assert_eq!(status.used, 0);
        assert_eq!(status.remaining, 2);
        assert!(!status.is_limited);
        assert_eq!(status.reset_in_seconds, None);
    }

    #[tokio::test]
    async fn test_status_reset_only_when_limited() {
        let f = fixture(vec![
            RateLimitConfig::new("architecture").with_requests_per_minute(1),
        ]);

        f.generated("architecture").await;
        f.clock.advance(Duration::milliseconds(20_500));

        let status = f.limiter.status("s1", "architecture").await.unwrap();
        assert!(status.is_limited);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.reset_in_seconds, Some(40));
    }

    #[tokio::test]
    async fn test_windows_are_per_prompt_type_and_session() {
        let f = fixture(vec![
            RateLimitConfig::new("architecture").with_requests_per_minute(1),
        ]);

        f.generated("architecture").await;

        assert!(f.limiter.check_admission("s1", "database").await.unwrap().is_allowed());
        assert!(f.limiter.check_admission("s2", "architecture").await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_heavy_traffic_elsewhere_keeps_window_intact() {
        let f = fixture(vec![
            RateLimitConfig::new("architecture").with_requests_per_minute(1),
        ]);

        f.generated("architecture").await;
        for i in 0..100_001 {
            f.usage
                .record(UsageEvent::cache_hit(
                    format!("busy-{}", i % 8),
                    "p1",
                    "architecture",
                    f.clock.now(),
                ))
                .await
                .unwrap();
        }

        let admission = f.limiter.check_admission("s1", "architecture").await.unwrap();
        assert_eq!(
            admission,
            Admission::Limited {
                used: 1,
                limit: 1,
                reset_in_seconds: 60
            }
        );
    }

    #[tokio::test]
    async fn test_status_all_includes_known_and_configured_types() {
        let f = fixture(vec![
            RateLimitConfig::new("architecture").with_requests_per_minute(4),
            RateLimitConfig::new("testing-strategy"),
        ]);

        let statuses = f.limiter.status_all("s1").await.unwrap();

        assert_eq!(statuses.len(), KNOWN_PROMPT_TYPES.len() + 1);
        assert_eq!(statuses[0].prompt_type, "architecture");
        assert_eq!(statuses[0].limit, 4);
        assert!(statuses.iter().any(|s| s.prompt_type == "testing-strategy"));
    }

    #[test]
    fn test_reset_rounds_up_and_clamps() {
        let now = Utc::now();

        assert_eq!(reset_in_seconds(Some(now - Duration::milliseconds(100)), now), 60);
        assert_eq!(reset_in_seconds(Some(now - Duration::seconds(59)), now), 1);
        assert_eq!(reset_in_seconds(Some(now - Duration::seconds(90)), now), 0);
        assert_eq!(reset_in_seconds(None, now), 60);
    }
}
