//! PromptForge API
//!
//! Metered AI prompt generation for a catalog of software projects:
//! - Credit accounts with an append-only transaction ledger
//! - Prompt caching per (project, prompt type) with configurable TTL
//! - Sliding-window rate limiting replayed from the usage log
//! - Stripe Checkout purchases reconciled by webhook or client verification

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::api::state::AppState;
use crate::config::StorageBackend;
use crate::domain::{
    Clock, CreditRepository, Difficulty, IdentityVerifier, Project, ProjectRepository,
    PromptCacheRepository, RateLimitConfigRepository, SystemClock, UsageRepository,
};
use crate::infrastructure::{
    auth::JwtIdentityVerifier,
    credit::{CreditLedger, InMemoryCreditRepository, PostgresCreditRepository},
    generation::{GenerationService, GenerationSettings},
    llm::{HttpClient, OpenAiCompatibleProvider},
    payment::{PaymentReconciler, StripeClient},
    project::{InMemoryProjectRepository, PostgresProjectRepository},
    prompt_cache::{InMemoryPromptCacheRepository, PostgresPromptCacheRepository, PromptCache},
    rate_limit::{
        CachedRateLimitConfigRepository, InMemoryRateLimitConfigRepository,
        PostgresRateLimitConfigRepository, RateLimiter,
    },
    storage::{connect_pool, run_migrations},
    usage::{InMemoryUsageRepository, PostgresUsageRepository, UsageRecorder},
};

struct Repositories {
    credits: Arc<dyn CreditRepository>,
    prompt_cache: Arc<dyn PromptCacheRepository>,
    usage: Arc<dyn UsageRepository>,
    rate_limits: Arc<dyn RateLimitConfigRepository>,
    projects: Arc<dyn ProjectRepository>,
}

/// Create the application state from configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repos = create_repositories(config).await?;

    let cache_ttl = Duration::from_secs(config.rate_limit.config_cache_ttl_secs);
    let rate_limits: Arc<dyn RateLimitConfigRepository> = if cache_ttl.is_zero() {
        repos.rate_limits
    } else {
        Arc::new(CachedRateLimitConfigRepository::new(repos.rate_limits, cache_ttl))
    };

    let ledger = Arc::new(
        CreditLedger::new(repos.credits, clock.clone())
            .with_signup_bonus(config.credits.signup_bonus),
    );
    let limiter = Arc::new(RateLimiter::new(
        rate_limits,
        repos.usage.clone(),
        clock.clone(),
    ));
    let usage = Arc::new(UsageRecorder::new(repos.usage, clock.clone()));
    let cache = Arc::new(PromptCache::new(repos.prompt_cache, clock.clone()));

    let generation = Arc::new(
        GenerationService::new(
            repos.projects.clone(),
            cache,
            limiter.clone(),
            usage.clone(),
            create_llm_provider(config)?,
        )
        .with_settings(GenerationSettings {
            model: config.generation.model.clone(),
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
        }),
    );

    if config.payments.secret_key.is_empty() || config.payments.webhook_secret.is_empty() {
        warn!("Stripe secret key or webhook secret not configured; payments will fail");
    }

    let stripe = StripeClient::new(
        config.payments.secret_key.clone(),
        Duration::from_secs(config.payments.timeout_secs),
    )?
    .with_api_base(config.payments.api_base.clone());
    let payments = Arc::new(
        PaymentReconciler::new(
            ledger.clone(),
            Arc::new(stripe),
            clock,
            config.payments.webhook_secret.clone(),
        )
        .with_tolerance_secs(config.payments.signature_tolerance_secs)
        .with_currency(config.payments.currency.clone()),
    );

    Ok(AppState {
        ledger,
        generation,
        limiter,
        usage,
        payments,
        projects: repos.projects,
        identity: create_identity_verifier(config)?,
    })
}

async fn create_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
    info!("Storage backend: {:?}", config.storage.backend);

    match config.storage.backend {
        StorageBackend::Memory => Ok(Repositories {
            credits: Arc::new(InMemoryCreditRepository::new()),
            prompt_cache: Arc::new(InMemoryPromptCacheRepository::new()),
            usage: Arc::new(InMemoryUsageRepository::default()),
            rate_limits: Arc::new(InMemoryRateLimitConfigRepository::new()),
            projects: Arc::new(InMemoryProjectRepository::with_projects(default_projects())),
        }),
        StorageBackend::Postgres => {
            info!("Connecting to PostgreSQL...");
            let pool = connect_pool(&config.storage.postgres()).await?;
            info!("PostgreSQL connection established");

            if config.storage.run_migrations {
                let applied = run_migrations(&pool).await?;
                info!(applied, "Database migrations complete");
            }

            Ok(Repositories {
                credits: Arc::new(PostgresCreditRepository::new(pool.clone())),
                prompt_cache: Arc::new(PostgresPromptCacheRepository::new(pool.clone())),
                usage: Arc::new(PostgresUsageRepository::new(pool.clone())),
                rate_limits: Arc::new(PostgresRateLimitConfigRepository::new(pool.clone())),
                projects: Arc::new(PostgresProjectRepository::new(pool)),
            })
        }
    }
}

fn create_llm_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn domain::LlmProvider>> {
    let generation = &config.generation;

    if generation.api_key.is_empty() {
        warn!("No generation API key configured; upstream calls will be rejected");
    }

    let client = HttpClient::with_timeout(Duration::from_secs(generation.timeout_secs))?;
    info!("Using OpenAI-compatible provider at {}", generation.base_url);

    Ok(Arc::new(OpenAiCompatibleProvider::with_base_url(
        client,
        generation.api_key.clone(),
        generation.base_url.clone(),
    )))
}

/// RS256 public key, else HS256 secret, else a random per-process secret
fn create_identity_verifier(config: &AppConfig) -> anyhow::Result<Arc<dyn IdentityVerifier>> {
    let auth = &config.auth;

    let verifier = match (&auth.jwt_public_key_pem, &auth.jwt_secret) {
        (Some(pem), _) if !pem.is_empty() => JwtIdentityVerifier::from_rsa_pem(pem)?,
        (_, Some(secret)) if !secret.is_empty() => JwtIdentityVerifier::from_secret(secret),
        _ => {
            warn!(
                "No auth.jwt_public_key_pem or auth.jwt_secret configured. \
                Generating random secret; no externally issued token will verify."
            );
            JwtIdentityVerifier::from_secret(&generate_random_secret())
        }
    };

    let verifier = match auth.issuer.as_deref() {
        Some(issuer) if !issuer.is_empty() => verifier.with_issuer(issuer),
        _ => verifier,
    };

    Ok(Arc::new(verifier))
}

fn generate_random_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

// ============================================================================
// Default Entities
// ============================================================================

fn default_projects() -> Vec<Project> {
    vec![
        Project::new("url-shortener", "URL Shortener", "Backend")
            .with_description("Shorten links and track click analytics")
            .with_difficulty(Difficulty::Beginner)
            .with_tech_stack(vec!["Rust".to_string(), "PostgreSQL".to_string()]),
        Project::new("realtime-chat", "Real-time Chat", "Full Stack")
            .with_description("Rooms, presence and message history over WebSockets")
            .with_difficulty(Difficulty::Intermediate)
            .with_tech_stack(vec![
                "TypeScript".to_string(),
                "Redis".to_string(),
                "WebSockets".to_string(),
            ]),
        Project::new("payment-gateway", "Payment Gateway", "Fintech")
            .with_description("Idempotent charges, refunds and webhook delivery")
            .with_difficulty(Difficulty::Advanced)
            .with_tech_stack(vec!["Go".to_string(), "Kafka".to_string()]),
    ]
}
