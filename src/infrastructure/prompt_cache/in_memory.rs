use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::prompt_cache::{CacheEntry, PromptCacheRepository};
use crate::domain::DomainError;

type CacheKey = (String, String);

/// In-memory prompt cache keyed by (project id, prompt type)
#[derive(Debug, Default)]
pub struct InMemoryPromptCacheRepository {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl InMemoryPromptCacheRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, live or expired
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl PromptCacheRepository for InMemoryPromptCacheRepository {
    async fn find_live(
        &self,
        project_id: &str,
        prompt_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DomainError> {
        let entries = self.entries.read().await;
        let key = (project_id.to_string(), prompt_type.to_string());

        Ok(entries.get(&key).filter(|e| e.is_live(now)).cloned())
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<CacheEntry, DomainError> {
        let mut entries = self.entries.write().await;
        let key = (entry.project_id.clone(), entry.prompt_type.clone());
        entries.insert(key, entry.clone());

        Ok(entry)
    }
}
