//! Generation orchestrator
//!
//! Sequences one generation request through the catalog, the prompt cache,
//! the rate limiter and the upstream model:
//!
//! 1. Resolve the subject from the catalog, falling back to inline data
//! 2. Serve a live cache entry without consulting the limiter
//! 3. Check admission for (session, prompt type)
//! 4. Call upstream with the fixed system role
//! 5. Cache the content with the prompt type's TTL and record usage

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::instruction::{SYSTEM_PROMPT, build_instruction, estimate_tokens};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::project::{ProjectData, ProjectRepository, ResolvedSubject};
use crate::domain::rate_limit::Admission;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_generation;
use crate::infrastructure::prompt_cache::PromptCache;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::usage::{RecordUsageParams, UsageRecorder};

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1200;

/// Upstream call parameters
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub project_id: String,
    pub prompt_type: String,
    pub session_id: String,
    pub project_data: Option<ProjectData>,
}

impl GenerateRequest {
    pub fn new(
        project_id: impl Into<String>,
        prompt_type: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            prompt_type: prompt_type.into(),
            session_id: session_id.into(),
            project_data: None,
        }
    }

    pub fn with_project_data(mut self, data: ProjectData) -> Self {
        self.project_data = Some(data);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateOutcome {
    pub content: String,
    pub cached: bool,
    pub token_estimate: u32,
}

#[derive(Debug)]
pub struct GenerationService {
    projects: Arc<dyn ProjectRepository>,
    cache: Arc<PromptCache>,
    limiter: Arc<RateLimiter>,
    usage: Arc<UsageRecorder>,
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        cache: Arc<PromptCache>,
        limiter: Arc<RateLimiter>,
        usage: Arc<UsageRecorder>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            projects,
            cache,
            limiter,
            usage,
            llm,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateOutcome, DomainError> {
        if request.session_id.trim().is_empty() {
            return Err(DomainError::validation("session_id is required"));
        }

        if request.prompt_type.trim().is_empty() {
            return Err(DomainError::validation("prompt_type is required"));
        }

        let subject = self.resolve_subject(&request).await?;
        let project_id = request.project_id.as_str();
        let prompt_type = request.prompt_type.as_str();

        if let Some(entry) = self.cache.get(project_id, prompt_type).await? {
            self.usage
                .record(RecordUsageParams::cache_hit(
                    &request.session_id,
                    project_id,
                    prompt_type,
                ))
                .await?;
            record_generation(prompt_type, "cache_hit");

            debug!(project_id = %project_id, prompt_type = %prompt_type, "Serving cached prompt");

            return Ok(GenerateOutcome {
                content: entry.content,
                cached: true,
                token_estimate: entry.token_estimate,
            });
        }

        match self
            .limiter
            .check_admission(&request.session_id, prompt_type)
            .await?
        {
            Admission::Allowed { .. } => {}
            Admission::Disabled => {
                record_generation(prompt_type, "disabled");
                return Err(DomainError::kind_disabled(prompt_type));
            }
            Admission::Limited { used, limit, .. } => {
                record_generation(prompt_type, "rate_limited");
                return Err(DomainError::rate_limited(limit, used));
            }
        }

        let content = self.call_upstream(prompt_type, &subject).await?;
        let token_estimate = estimate_tokens(&content);
        let config = self.limiter.config_for(prompt_type).await?;

        self.cache
            .put(
                project_id,
                prompt_type,
                &content,
                token_estimate,
                config.cache_ttl_hours,
            )
            .await?;

        self.usage
            .record(RecordUsageParams::generated(
                &request.session_id,
                project_id,
                prompt_type,
                token_estimate,
            ))
            .await?;
        record_generation(prompt_type, "generated");

        info!(
            project_id = %project_id,
            prompt_type = %prompt_type,
            session_id = %request.session_id,
            token_estimate,
            "Generated prompt"
        );

        Ok(GenerateOutcome {
            content,
            cached: false,
            token_estimate,
        })
    }

    async fn resolve_subject(&self, request: &GenerateRequest) -> Result<ResolvedSubject, DomainError> {
        if let Some(project) = self.projects.get(&request.project_id).await? {
            return Ok(ResolvedSubject::from(&project));
        }

        match request.project_data {
            Some(ref data) => Ok(ResolvedSubject::from(data)),
            None => Err(DomainError::missing_subject_data(format!(
                "Project '{}' not found and no project data supplied",
                request.project_id
            ))),
        }
    }

    async fn call_upstream(
        &self,
        prompt_type: &str,
        subject: &ResolvedSubject,
    ) -> Result<String, DomainError> {
        let llm_request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(build_instruction(prompt_type, &subject.title, &subject.category))
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build();

        let response = match self.llm.chat(&self.settings.model, llm_request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    provider = self.llm.provider_name(),
                    prompt_type = %prompt_type,
                    error = %e,
                    "Upstream generation failed"
                );
                record_generation(prompt_type, "upstream_failed");
                return Err(DomainError::upstream_generation_failed(e.to_string()));
            }
        };

        let content = response.content().to_string();
        if content.trim().is_empty() {
            warn!(prompt_type = %prompt_type, "Upstream returned an empty completion");
            record_generation(prompt_type, "upstream_failed");
            return Err(DomainError::upstream_generation_failed("empty completion"));
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::mock::ManualClock;
    use crate::domain::llm::mock::MockLlmProvider;
    use crate::domain::project::Project;
    use crate::domain::rate_limit::RateLimitConfig;
    use crate::domain::usage::{UsageQuery, UsageRepository};
    use crate::infrastructure::project::InMemoryProjectRepository;
    use crate::infrastructure::prompt_cache::InMemoryPromptCacheRepository;
    use crate::infrastructure::rate_limit::InMemoryRateLimitConfigRepository;
    use crate::infrastructure::usage::InMemoryUsageRepository;
    use chrono::Duration;

    struct Harness {
        service: GenerationService,
        llm: Arc<MockLlmProvider>,
        usage: Arc<InMemoryUsageRepository>,
        clock: Arc<ManualClock>,
    }

    fn harness(llm: MockLlmProvider, configs: Vec<RateLimitConfig>) -> Harness {
        let clock = Arc::new(ManualClock::fixed());
        let usage = Arc::new(InMemoryUsageRepository::default());
        let llm = Arc::new(llm);
        let projects = Arc::new(InMemoryProjectRepository::with_projects(vec![
            Project::new("p1", "URL Shortener", "backend"),
        ]));

        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryRateLimitConfigRepository::with_configs(configs)),
            usage.clone(),
            clock.clone(),
        ));
        let cache = Arc::new(PromptCache::new(
            Arc::new(InMemoryPromptCacheRepository::new()),
            clock.clone(),
        ));
        let recorder = Arc::new(UsageRecorder::new(usage.clone(), clock.clone()));

        let service = GenerationService::new(projects, cache, limiter, recorder, llm.clone());

        Harness {
            service,
            llm,
            usage,
            clock,
        }
    }

    async fn events(usage: &InMemoryUsageRepository) -> Vec<crate::domain::usage::UsageEvent> {
        usage.query(&UsageQuery::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit_then_other_kind() {
        let h = harness(
            MockLlmProvider::replying("# Architecture plan"),
            vec![
                RateLimitConfig::new("architecture")
                    .with_requests_per_minute(2)
                    .with_cache_ttl_hours(1),
            ],
        );

        let first = h
            .service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap();
        assert!(!first.cached);
        assert_eq!(first.content, "# Architecture plan");
        assert_eq!(first.token_estimate, 5);

        let second = h
            .service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.content, first.content);
        assert_eq!(h.llm.calls(), 1);

        let third = h
            .service
            .generate(GenerateRequest::new("p1", "database", "s1"))
            .await
            .unwrap();
        assert!(!third.cached);
        assert_eq!(h.llm.calls(), 2);

        let recorded = events(&h.usage).await;
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded.iter().filter(|e| e.cached).count(), 1);
        assert!(recorded.iter().filter(|e| e.cached).all(|e| e.tokens_used == 0));
    }

    #[tokio::test]
    async fn test_upstream_receives_instruction_and_parameters() {
        let h = harness(MockLlmProvider::replying("ok"), vec![]);

        h.service
            .generate(GenerateRequest::new("p1", "database", "s1"))
            .await
            .unwrap();

        let request = h.llm.last_request().unwrap();
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert!(request.messages[1].content.contains("Project Title:\nURL Shortener"));
        assert!(request.messages[1].content.contains("Category / Tech Stack:\nbackend"));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1200));
    }

    #[tokio::test]
    async fn test_inline_project_data_when_not_in_catalog() {
        let h = harness(MockLlmProvider::replying("ok"), vec![]);
        let data = ProjectData {
            title: "Chat".to_string(),
            tech_stack: vec!["Rust".to_string(), "WebSockets".to_string()],
            ..Default::default()
        };

        h.service
            .generate(GenerateRequest::new("ext-1", "backend-api", "s1").with_project_data(data))
            .await
            .unwrap();

        let request = h.llm.last_request().unwrap();
        assert!(request.messages[1].content.contains("Rust, WebSockets"));
    }

    #[tokio::test]
    async fn test_missing_project_data() {
        let h = harness(MockLlmProvider::replying("ok"), vec![]);

        let err = h
            .service
            .generate(GenerateRequest::new("ext-1", "architecture", "s1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::MissingSubjectData { .. }));
        assert_eq!(h.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_session_is_rejected() {
        let h = harness(MockLlmProvider::replying("ok"), vec![]);

        let err = h
            .service
            .generate(GenerateRequest::new("p1", "architecture", " "))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_rate_limited_records_nothing() {
        let h = harness(
            MockLlmProvider::replying("ok"),
            vec![RateLimitConfig::new("architecture").with_requests_per_minute(1)],
        );

        h.service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap();

        // Different project so the cache does not answer
        let data = ProjectData {
            title: "Other".to_string(),
            ..Default::default()
        };
        let err = h
            .service
            .generate(GenerateRequest::new("p2", "architecture", "s1").with_project_data(data))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::RateLimited { limit: 1, used: 1 }));
        assert_eq!(events(&h.usage).await.len(), 1);
        assert_eq!(h.llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_disabled_kind() {
        let h = harness(
            MockLlmProvider::replying("ok"),
            vec![RateLimitConfig::new("edge-cases").disabled()],
        );

        let err = h
            .service
            .generate(GenerateRequest::new("p1", "edge-cases", "s1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::KindDisabled { .. }));
        assert_eq!(h.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_writes_nothing() {
        let h = harness(MockLlmProvider::failing("HTTP 500"), vec![]);

        let err = h
            .service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::UpstreamGenerationFailed { .. }));
        assert!(events(&h.usage).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_completion_is_failure() {
        let h = harness(MockLlmProvider::replying("   "), vec![]);

        let err = h
            .service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::UpstreamGenerationFailed { .. }));
    }

    #[tokio::test]
    async fn test_expired_entry_regenerates() {
        let h = harness(
            MockLlmProvider::replying("fresh"),
            vec![RateLimitConfig::new("architecture").with_cache_ttl_hours(1)],
        );

        h.service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap();
        h.clock.advance(Duration::hours(2));

        let outcome = h
            .service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap();

        assert!(!outcome.cached);
        assert_eq!(h.llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_hits_do_not_consume_display_quota() {
        let h = harness(MockLlmProvider::replying("ok"), vec![]);

        h.service
            .generate(GenerateRequest::new("p1", "architecture", "s1"))
            .await
            .unwrap();
        for _ in 0..10 {
            h.service
                .generate(GenerateRequest::new("p1", "architecture", "s1"))
                .await
                .unwrap();
        }

        let outcome = h
            .service
            .generate(GenerateRequest::new("p1", "database", "s1"))
            .await
            .unwrap();
        assert!(!outcome.cached);

        let status = h.service.limiter.status("s1", "architecture").await.unwrap();
        assert_eq!(status.used, 1);
    }
}
