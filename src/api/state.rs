//! Application state for shared services

use std::sync::Arc;

use crate::domain::identity::IdentityVerifier;
use crate::domain::project::ProjectRepository;
use crate::infrastructure::credit::CreditLedger;
use crate::infrastructure::generation::GenerationService;
use crate::infrastructure::payment::PaymentReconciler;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::usage::UsageRecorder;

/// Services shared by every handler; cloning is cheap
#[derive(Debug, Clone)]
pub struct AppState {
    pub ledger: Arc<CreditLedger>,
    pub generation: Arc<GenerationService>,
    pub limiter: Arc<RateLimiter>,
    pub usage: Arc<UsageRecorder>,
    pub payments: Arc<PaymentReconciler>,
    pub projects: Arc<dyn ProjectRepository>,
    pub identity: Arc<dyn IdentityVerifier>,
}
