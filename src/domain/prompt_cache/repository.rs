use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::CacheEntry;
use crate::domain::DomainError;

/// Storage for generated prompts, one row per (project, prompt type)
#[async_trait]
pub trait PromptCacheRepository: Send + Sync + Debug {
    /// Get the entry for the key if it is still live at `now`
    async fn find_live(
        &self,
        project_id: &str,
        prompt_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DomainError>;

    /// Insert or fully replace the entry for the key
    async fn upsert(&self, entry: CacheEntry) -> Result<CacheEntry, DomainError>;
}
