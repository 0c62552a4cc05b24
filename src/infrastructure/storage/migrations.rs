//! Versioned schema migrations tracked in `_migrations`

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL applied going forward; may contain several statements
    pub up: String,
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Apply one migration in its own transaction unless already recorded.
    /// Returns whether it ran.
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check migration status: {}", e))
                })?;

        if applied {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        info!(version = migration.version, description = %migration.description, "Applied migration");

        Ok(true)
    }

    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// Schema for every PostgreSQL-backed repository
pub fn promptforge_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create credit ledger tables",
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                subject_id TEXT PRIMARY KEY,
                balance BIGINT NOT NULL CHECK (balance >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE TABLE IF NOT EXISTS credit_transactions (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL,
                amount BIGINT NOT NULL,
                kind TEXT NOT NULL,
                description TEXT NOT NULL,
                external_session_id TEXT UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_credit_transactions_subject
                ON credit_transactions (subject_id, created_at DESC);
            "#,
            r#"
            DROP TABLE IF EXISTS credit_transactions;
            DROP TABLE IF EXISTS accounts;
            "#,
        ),
        Migration::new(
            2,
            "Create prompt cache table",
            r#"
            CREATE TABLE IF NOT EXISTS prompt_cache (
                project_id TEXT NOT NULL,
                prompt_type TEXT NOT NULL,
                content TEXT NOT NULL,
                token_estimate INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                expires_at TIMESTAMPTZ NOT NULL,
                UNIQUE (project_id, prompt_type)
            );
            "#,
            r#"
            DROP TABLE IF EXISTS prompt_cache;
            "#,
        ),
        Migration::new(
            3,
            "Create usage events table",
            r#"
            CREATE TABLE IF NOT EXISTS usage_events (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                prompt_type TEXT NOT NULL,
                tokens_used INTEGER NOT NULL DEFAULT 0,
                cached BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_usage_events_window
                ON usage_events (session_id, prompt_type, created_at);
            "#,
            r#"
            DROP TABLE IF EXISTS usage_events;
            "#,
        ),
        Migration::new(
            4,
            "Create rate limit config table",
            r#"
            CREATE TABLE IF NOT EXISTS rate_limit_config (
                prompt_type TEXT PRIMARY KEY,
                requests_per_minute INTEGER NOT NULL DEFAULT 10 CHECK (requests_per_minute > 0),
                cache_ttl_hours INTEGER NOT NULL DEFAULT 168,
                is_enabled BOOLEAN NOT NULL DEFAULT TRUE
            );
            "#,
            r#"
            DROP TABLE IF EXISTS rate_limit_config;
            "#,
        ),
        Migration::new(
            5,
            "Create projects table",
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                problem_statement TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL DEFAULT 'beginner',
                tech_stack TEXT[] NOT NULL DEFAULT '{}',
                features TEXT[] NOT NULL DEFAULT '{}',
                category TEXT NOT NULL,
                system_design_overview TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
            r#"
            DROP TABLE IF EXISTS projects;
            "#,
        ),
    ]
}

/// Apply every pending migration in version order
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in promptforge_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}
