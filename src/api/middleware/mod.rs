//! API middleware components

pub mod auth;
pub mod metrics;

pub use auth::RequireSubject;
pub use metrics::metrics_middleware;
