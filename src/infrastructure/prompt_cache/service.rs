//! Prompt cache service
//!
//! Expiry is evaluated against the injected clock on every read; expired
//! entries are never returned and are overwritten by the next `put`.

use std::sync::Arc;

use crate::domain::prompt_cache::{CacheEntry, PromptCacheRepository};
use crate::domain::{Clock, DomainError};

#[derive(Debug)]
pub struct PromptCache {
    repository: Arc<dyn PromptCacheRepository>,
    clock: Arc<dyn Clock>,
}

impl PromptCache {
    pub fn new(repository: Arc<dyn PromptCacheRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn get(
        &self,
        project_id: &str,
        prompt_type: &str,
    ) -> Result<Option<CacheEntry>, DomainError> {
        self.repository
            .find_live(project_id, prompt_type, self.clock.now())
            .await
    }

    pub async fn put(
        &self,
        project_id: &str,
        prompt_type: &str,
        content: &str,
        token_estimate: u32,
        ttl_hours: u32,
    ) -> Result<CacheEntry, DomainError> {
        let entry = CacheEntry::new(
            project_id,
            prompt_type,
            content,
            token_estimate,
            self.clock.now(),
            ttl_hours,
        );

        self.repository.upsert(entry).await
    }
}
