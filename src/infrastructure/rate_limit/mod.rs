//! Rate limiting infrastructure implementations

mod cached;
mod in_memory;
mod limiter;
mod postgres;

pub use cached::CachedRateLimitConfigRepository;
pub use in_memory::InMemoryRateLimitConfigRepository;
pub use limiter::RateLimiter;
pub use postgres::PostgresRateLimitConfigRepository;
