//! Upstream LLM provider implementations

mod http_client;
mod openai;

pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::{DEFAULT_BASE_URL, OpenAiCompatibleProvider};
