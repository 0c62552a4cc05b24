//! Rate limiting domain

mod config;
mod repository;
mod status;

pub use config::{DEFAULT_CACHE_TTL_HOURS, DEFAULT_REQUESTS_PER_MINUTE, RateLimitConfig};
pub use repository::RateLimitConfigRepository;
pub use status::{Admission, RateLimitStatus};

/// Length of the sliding window in seconds
pub const WINDOW_SECONDS: i64 = 60;

/// Prompt types offered to clients; administered configs may add more
pub const KNOWN_PROMPT_TYPES: [&str; 6] = [
    "architecture",
    "database",
    "backend-api",
    "authentication",
    "edge-cases",
    "cursor-optimized",
];
