//! In-memory application state for handler tests

use std::sync::Arc;

use crate::api::state::AppState;
use crate::domain::llm::mock::MockLlmProvider;
use crate::domain::payment::MockPaymentProvider;
use crate::domain::project::Project;
use crate::domain::rate_limit::RateLimitConfig;
use crate::domain::{Clock, SystemClock};
use crate::infrastructure::auth::{JwtIdentityVerifier, issue_test_token};
use crate::infrastructure::credit::{CreditLedger, InMemoryCreditRepository};
use crate::infrastructure::generation::GenerationService;
use crate::infrastructure::payment::PaymentReconciler;
use crate::infrastructure::project::InMemoryProjectRepository;
use crate::infrastructure::prompt_cache::{InMemoryPromptCacheRepository, PromptCache};
use crate::infrastructure::rate_limit::{InMemoryRateLimitConfigRepository, RateLimiter};
use crate::infrastructure::usage::{InMemoryUsageRepository, UsageRecorder};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";

pub fn bearer(subject: &str) -> String {
    format!("Bearer {}", issue_test_token(JWT_SECRET, subject, None))
}

pub struct TestState {
    llm: MockLlmProvider,
    payments: MockPaymentProvider,
    configs: Vec<RateLimitConfig>,
}

impl TestState {
    pub fn new() -> Self {
        Self {
            llm: MockLlmProvider::replying("# Generated prompt"),
            payments: MockPaymentProvider::new(),
            configs: Vec::new(),
        }
    }

    pub fn with_llm(mut self, llm: MockLlmProvider) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_payments(mut self, payments: MockPaymentProvider) -> Self {
        self.payments = payments;
        self
    }

    pub fn with_config(mut self, config: RateLimitConfig) -> Self {
        self.configs.push(config);
        self
    }

    pub fn build(self) -> AppState {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let usage_repo = Arc::new(InMemoryUsageRepository::default());
        let projects = Arc::new(InMemoryProjectRepository::with_projects(vec![
            Project::new("p1", "URL Shortener", "backend"),
        ]));

        let ledger = Arc::new(CreditLedger::new(
            Arc::new(InMemoryCreditRepository::new()),
            clock.clone(),
        ));
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryRateLimitConfigRepository::with_configs(self.configs)),
            usage_repo.clone(),
            clock.clone(),
        ));
        let usage = Arc::new(UsageRecorder::new(usage_repo, clock.clone()));
        let cache = Arc::new(PromptCache::new(
            Arc::new(InMemoryPromptCacheRepository::new()),
            clock.clone(),
        ));

        let generation = Arc::new(GenerationService::new(
            projects.clone(),
            cache,
            limiter.clone(),
            usage.clone(),
            Arc::new(self.llm),
        ));
        let payments = Arc::new(PaymentReconciler::new(
            ledger.clone(),
            Arc::new(self.payments),
            clock,
            WEBHOOK_SECRET,
        ));

        AppState {
            ledger,
            generation,
            limiter,
            usage,
            payments,
            projects,
            identity: Arc::new(JwtIdentityVerifier::from_secret(JWT_SECRET)),
        }
    }
}
