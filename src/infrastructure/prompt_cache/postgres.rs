use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::prompt_cache::{CacheEntry, PromptCacheRepository};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresPromptCacheRepository {
    pool: PgPool,
}

impl PostgresPromptCacheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromptCacheRepository for PostgresPromptCacheRepository {
    async fn find_live(
        &self,
        project_id: &str,
        prompt_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT project_id, prompt_type, content, token_estimate, created_at, expires_at
            FROM prompt_cache
            WHERE project_id = $1 AND prompt_type = $2 AND expires_at > $3
            "#,
        )
        .bind(project_id)
        .bind(prompt_type)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to read prompt cache: {}", e)))?;

        Ok(row.as_ref().map(row_to_entry))
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<CacheEntry, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO prompt_cache
                (project_id, prompt_type, content, token_estimate, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (project_id, prompt_type)
            DO UPDATE SET content = EXCLUDED.content,
                          token_estimate = EXCLUDED.token_estimate,
                          created_at = EXCLUDED.created_at,
                          expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&entry.project_id)
        .bind(&entry.prompt_type)
        .bind(&entry.content)
        .bind(entry.token_estimate as i32)
        .bind(entry.created_at)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to write prompt cache: {}", e)))?;

        Ok(entry)
    }
}

fn row_to_entry(row: &PgRow) -> CacheEntry {
    let token_estimate: i32 = row.get("token_estimate");

    CacheEntry {
        project_id: row.get("project_id"),
        prompt_type: row.get("prompt_type"),
        content: row.get("content"),
        token_estimate: token_estimate.max(0) as u32,
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
    }
}
