//! Prompt cache infrastructure implementations

mod in_memory;
mod postgres;
mod service;

pub use in_memory::InMemoryPromptCacheRepository;
pub use postgres::PostgresPromptCacheRepository;
pub use service::PromptCache;
