use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 10;
pub const DEFAULT_CACHE_TTL_HOURS: u32 = 168;

/// Per prompt type quota and cache lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub prompt_type: String,
    pub requests_per_minute: u32,
    pub cache_ttl_hours: u32,
    pub is_enabled: bool,
}

impl RateLimitConfig {
    pub fn new(prompt_type: impl Into<String>) -> Self {
        Self {
            prompt_type: prompt_type.into(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            is_enabled: true,
        }
    }

    pub fn with_requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = rpm;
        self
    }

    pub fn with_cache_ttl_hours(mut self, hours: u32) -> Self {
        self.cache_ttl_hours = hours;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateLimitConfig::new("architecture");
        assert_eq!(config.requests_per_minute, 10);
        assert_eq!(config.cache_ttl_hours, 168);
        assert!(config.is_enabled);
    }
}
