//! Prompt cache domain

mod entry;
mod repository;

pub use entry::CacheEntry;
pub use repository::PromptCacheRepository;
