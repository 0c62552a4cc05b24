//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, CorsConfig, CreditsConfig, GenerationConfig, LogFormat, LoggingConfig,
    MetricsConfig, PaymentsConfig, RateLimitSettings, ServerConfig, StorageBackend, StorageConfig,
};
