//! Infrastructure layer - Storage, upstream clients and services

pub mod auth;
pub mod credit;
pub mod generation;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod payment;
pub mod project;
pub mod prompt_cache;
pub mod rate_limit;
pub mod storage;
pub mod usage;
