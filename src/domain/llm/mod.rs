//! Upstream generation domain

mod message;
mod provider;
mod request;
mod response;

#[cfg(test)]
pub use provider::mock;
pub use message::{Message, MessageRole};
pub use provider::LlmProvider;
pub use request::{LlmRequest, LlmRequestBuilder};
pub use response::{LlmResponse, Usage};
