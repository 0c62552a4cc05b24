use async_trait::async_trait;
use std::fmt::Debug;

use super::RateLimitConfig;
use crate::domain::DomainError;

/// Read-only access to administered rate limit configuration
#[async_trait]
pub trait RateLimitConfigRepository: Send + Sync + Debug {
    async fn get(&self, prompt_type: &str) -> Result<Option<RateLimitConfig>, DomainError>;

    async fn list(&self) -> Result<Vec<RateLimitConfig>, DomainError>;
}
