//! PostgreSQL usage repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::domain::usage::{UsageAggregate, UsageEvent, UsageEventId, UsageQuery, UsageRepository};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresUsageRepository {
    pool: PgPool,
}

impl PostgresUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append `WHERE` conditions for every filter set on the query
fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a UsageQuery) {
    qb.push(" WHERE TRUE");

    if let Some(ref session_id) = query.session_id {
        qb.push(" AND session_id = ").push_bind(session_id.as_str());
    }

    if let Some(ref prompt_type) = query.prompt_type {
        qb.push(" AND prompt_type = ").push_bind(prompt_type.as_str());
    }

    if let Some(cached) = query.cached {
        qb.push(" AND cached = ").push_bind(cached);
    }

    if let Some(since) = query.since {
        qb.push(" AND created_at >= ").push_bind(since);
    }

    if let Some(until) = query.until {
        qb.push(" AND created_at <= ").push_bind(until);
    }
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn record(&self, event: UsageEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO usage_events
                (id, session_id, project_id, prompt_type, tokens_used, cached, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id().as_str())
        .bind(&event.session_id)
        .bind(&event.project_id)
        .bind(&event.prompt_type)
        .bind(event.tokens_used as i32)
        .bind(event.cached)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record usage: {}", e)))?;

        Ok(())
    }

    async fn query(&self, query: &UsageQuery) -> Result<Vec<UsageEvent>, DomainError> {
        let mut qb = QueryBuilder::new(
            "SELECT id, session_id, project_id, prompt_type, tokens_used, cached, created_at \
             FROM usage_events",
        );
        push_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC");

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }

        if let Some(offset) = query.offset {
            qb.push(" OFFSET ").push_bind(offset as i64);
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query usage: {}", e)))?;

        Ok(rows.iter().map(row_to_event).collect())
    }

    async fn count(&self, query: &UsageQuery) -> Result<usize, DomainError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM usage_events");
        push_filters(&mut qb, query);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count usage: {}", e)))?;

        Ok(count as usize)
    }

    async fn oldest(&self, query: &UsageQuery) -> Result<Option<DateTime<Utc>>, DomainError> {
        let mut qb = QueryBuilder::new("SELECT MIN(created_at) FROM usage_events");
        push_filters(&mut qb, query);

        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read oldest usage: {}", e)))
    }

    async fn aggregate(&self, query: &UsageQuery) -> Result<UsageAggregate, DomainError> {
        let mut qb = QueryBuilder::new(
            "SELECT COUNT(*) AS total_events, \
             COUNT(*) FILTER (WHERE cached) AS cached_events, \
             COALESCE(SUM(tokens_used), 0)::BIGINT AS total_tokens \
             FROM usage_events",
        );
        push_filters(&mut qb, query);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to aggregate usage: {}", e)))?;

        let total_events: i64 = row.get("total_events");
        let cached_events: i64 = row.get("cached_events");
        let total_tokens: i64 = row.get("total_tokens");

        Ok(UsageAggregate {
            total_events: total_events as u64,
            cached_events: cached_events as u64,
            generated_events: (total_events - cached_events) as u64,
            total_tokens: total_tokens as u64,
        })
    }
}

fn row_to_event(row: &PgRow) -> UsageEvent {
    let id: String = row.get("id");
    let tokens_used: i32 = row.get("tokens_used");

    UsageEvent::new(
        row.get::<String, _>("session_id"),
        row.get::<String, _>("project_id"),
        row.get::<String, _>("prompt_type"),
        tokens_used.max(0) as u32,
        row.get("cached"),
        row.get("created_at"),
    )
    .with_id(UsageEventId::new(id))
}
