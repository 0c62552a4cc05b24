use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponse, Message, Usage};
use crate::domain::DomainError;

/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";

const PROVIDER: &str = "openai-compatible";

/// Chat completions client for any OpenAI-compatible API
#[derive(Debug)]
pub struct OpenAiCompatibleProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiCompatibleProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<WireMessage<'_>> = request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: CompletionResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider(PROVIDER, "No choices in response"))?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());
        let mut llm_response = LlmResponse::new(
            response.id.unwrap_or_default(),
            response.model.unwrap_or_default(),
            message,
        );

        if let Some(usage) = response.usage {
            llm_response =
                llm_response.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiCompatibleProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let body = self.build_request(model, &request);
        let json = self
            .client
            .post_json(
                &self.chat_completions_url(),
                vec![
                    ("Authorization", self.auth_header.as_str()),
                    ("Content-Type", "application/json"),
                ],
                &body,
            )
            .await?;

        self.parse_response(json)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

    fn request() -> LlmRequest {
        LlmRequest::builder()
            .system("You are helpful")
            .user("Hello")
            .temperature(0.7)
            .max_tokens(1200)
            .build()
    }

    #[tokio::test]
    async fn test_chat_parses_first_choice() {
        let client = MockHttpClient::new().with_response(
            GROQ_URL,
            serde_json::json!({
                "id": "chatcmpl-1",
                "model": "llama-3.1-8b-instant",
                "choices": [{
                    "message": {"role": "assistant", "content": "## Architecture"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
            }),
        );
        let provider = OpenAiCompatibleProvider::new(client, "gsk-test");

        let response = provider.chat("llama-3.1-8b-instant", request()).await.unwrap();

        assert_eq!(response.content(), "## Architecture");
        assert_eq!(response.usage.unwrap().total_tokens, 25);
    }

    #[tokio::test]
    async fn test_request_body_carries_parameters() {
        let client = MockHttpClient::new()
            .with_response(GROQ_URL, serde_json::json!({"choices": []}));
        let provider = OpenAiCompatibleProvider::new(client, "gsk-test");

        let result = provider.chat("llama-3.1-8b-instant", request()).await;
        assert!(result.is_err());

        let body = provider.client.last_body().unwrap();
        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["max_tokens"], 1200);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = MockHttpClient::new().with_error(GROQ_URL, "HTTP 500");
        let provider = OpenAiCompatibleProvider::new(client, "gsk-test");

        let err = provider.chat("m", request()).await.unwrap_err();
        assert!(matches!(err, DomainError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let client = MockHttpClient::new().with_response(
            "http://localhost:9000/v1/chat/completions",
            serde_json::json!({"choices": [{"message": {"content": "ok"}}]}),
        );
        let provider =
            OpenAiCompatibleProvider::with_base_url(client, "k", "http://localhost:9000/");

        assert_eq!(provider.chat("m", request()).await.unwrap().content(), "ok");
    }

    #[tokio::test]
    async fn test_chat_over_http_sends_bearer_auth() {
        use crate::infrastructure::llm::HttpClient;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk-live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-9",
                "model": "llama-3.1-8b-instant",
                "choices": [{"message": {"content": "generated"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            OpenAiCompatibleProvider::with_base_url(HttpClient::new(), "gsk-live", server.uri());

        let response = provider.chat("llama-3.1-8b-instant", request()).await.unwrap();
        assert_eq!(response.content(), "generated");
    }

    #[tokio::test]
    async fn test_http_error_status_is_provider_error() {
        use crate::infrastructure::llm::HttpClient;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let provider = OpenAiCompatibleProvider::with_base_url(HttpClient::new(), "k", server.uri());

        let err = provider.chat("m", request()).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
