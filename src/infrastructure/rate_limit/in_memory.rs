use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::rate_limit::{RateLimitConfig, RateLimitConfigRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryRateLimitConfigRepository {
    configs: RwLock<HashMap<String, RateLimitConfig>>,
}

impl InMemoryRateLimitConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configs(configs: Vec<RateLimitConfig>) -> Self {
        let map = configs
            .into_iter()
            .map(|c| (c.prompt_type.clone(), c))
            .collect();

        Self {
            configs: RwLock::new(map),
        }
    }

    pub async fn upsert(&self, config: RateLimitConfig) {
        self.configs
            .write()
            .await
            .insert(config.prompt_type.clone(), config);
    }
}

#[async_trait]
impl RateLimitConfigRepository for InMemoryRateLimitConfigRepository {
    async fn get(&self, prompt_type: &str) -> Result<Option<RateLimitConfig>, DomainError> {
        Ok(self.configs.read().await.get(prompt_type).cloned())
    }

    async fn list(&self) -> Result<Vec<RateLimitConfig>, DomainError> {
        let mut configs: Vec<_> = self.configs.read().await.values().cloned().collect();
        configs.sort_by(|a, b| a.prompt_type.cmp(&b.prompt_type));

        Ok(configs)
    }
}
