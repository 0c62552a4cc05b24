use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::rate_limit::{RateLimitConfig, RateLimitConfigRepository};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresRateLimitConfigRepository {
    pool: PgPool,
}

impl PostgresRateLimitConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitConfigRepository for PostgresRateLimitConfigRepository {
    async fn get(&self, prompt_type: &str) -> Result<Option<RateLimitConfig>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT prompt_type, requests_per_minute, cache_ttl_hours, is_enabled
            FROM rate_limit_config
            WHERE prompt_type = $1
            "#,
        )
        .bind(prompt_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get rate limit config: {}", e)))?;

        Ok(row.as_ref().map(row_to_config))
    }

    async fn list(&self) -> Result<Vec<RateLimitConfig>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT prompt_type, requests_per_minute, cache_ttl_hours, is_enabled
            FROM rate_limit_config
            ORDER BY prompt_type
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list rate limit configs: {}", e)))?;

        Ok(rows.iter().map(row_to_config).collect())
    }
}

fn row_to_config(row: &PgRow) -> RateLimitConfig {
    let rpm: i32 = row.get("requests_per_minute");
    let ttl: i32 = row.get("cache_ttl_hours");

    RateLimitConfig {
        prompt_type: row.get("prompt_type"),
        requests_per_minute: rpm.max(1) as u32,
        cache_ttl_hours: ttl.max(0) as u32,
        is_enabled: row.get("is_enabled"),
    }
}
