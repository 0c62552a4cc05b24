//! Domain layer - Core business logic and entities

pub mod clock;
pub mod credit;
pub mod error;
pub mod identity;
pub mod llm;
pub mod payment;
pub mod project;
pub mod prompt_cache;
pub mod rate_limit;
pub mod usage;

pub use clock::{Clock, SystemClock};
pub use credit::{Account, CreditRepository, Transaction, TransactionId, TransactionKind};
pub use error::DomainError;
pub use identity::{IdentityVerifier, SubjectId};
pub use llm::{LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole, Usage};
pub use payment::{CheckoutRequest, CheckoutSession, PaymentProvider, PaymentStatus, Plan, WebhookEvent};
pub use project::{Difficulty, Project, ProjectData, ProjectRepository, ResolvedSubject};
pub use prompt_cache::{CacheEntry, PromptCacheRepository};
pub use rate_limit::{Admission, RateLimitConfig, RateLimitConfigRepository, RateLimitStatus};
pub use usage::{UsageAggregate, UsageEvent, UsageEventId, UsageQuery, UsageRepository};
