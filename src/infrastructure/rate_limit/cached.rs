//! Read-through moka cache in front of a rate limit config repository

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::rate_limit::{RateLimitConfig, RateLimitConfigRepository};
use crate::domain::DomainError;

/// Caches lookups, including misses, for a short TTL. Errors are not cached.
#[derive(Debug)]
pub struct CachedRateLimitConfigRepository {
    inner: Arc<dyn RateLimitConfigRepository>,
    cache: MokaCache<String, Option<RateLimitConfig>>,
}

impl CachedRateLimitConfigRepository {
    pub fn new(inner: Arc<dyn RateLimitConfigRepository>, ttl: Duration) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(1_000)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl RateLimitConfigRepository for CachedRateLimitConfigRepository {
    async fn get(&self, prompt_type: &str) -> Result<Option<RateLimitConfig>, DomainError> {
        if let Some(cached) = self.cache.get(prompt_type).await {
            return Ok(cached);
        }

        let config = self.inner.get(prompt_type).await?;
        self.cache
            .insert(prompt_type.to_string(), config.clone())
            .await;

        Ok(config)
    }

    async fn list(&self) -> Result<Vec<RateLimitConfig>, DomainError> {
        self.inner.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::rate_limit::InMemoryRateLimitConfigRepository;

    #[tokio::test]
    async fn test_serves_cached_value_until_ttl() {
        let inner = Arc::new(InMemoryRateLimitConfigRepository::with_configs(vec![
            RateLimitConfig::new("architecture").with_requests_per_minute(3),
        ]));
        let cached = CachedRateLimitConfigRepository::new(inner.clone(), Duration::from_secs(60));

        let first = cached.get("architecture").await.unwrap().unwrap();
        assert_eq!(first.requests_per_minute, 3);

        inner
            .upsert(RateLimitConfig::new("architecture").with_requests_per_minute(5))
            .await;

        let second = cached.get("architecture").await.unwrap().unwrap();
        assert_eq!(second.requests_per_minute, 3);
    }

    #[tokio::test]
    async fn test_misses_are_cached() {
        let inner = Arc::new(InMemoryRateLimitConfigRepository::new());
        let cached = CachedRateLimitConfigRepository::new(inner, Duration::from_secs(60));

        assert!(cached.get("database").await.unwrap().is_none());
        assert!(cached.get("database").await.unwrap().is_none());
    }
}
