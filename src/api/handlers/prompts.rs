//! Prompt generation and quota endpoints

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::RequireSubject;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::project::ProjectData;
use crate::domain::rate_limit::RateLimitStatus;
use crate::infrastructure::generation::{GenerateOutcome, GenerateRequest};

/// Accepts both snake_case and the camelCase keys older clients send
#[derive(Debug, Deserialize)]
pub struct GeneratePromptBody {
    #[serde(default, alias = "sessionId")]
    pub session_id: String,
    #[serde(default, alias = "promptType")]
    pub prompt_type: String,
    #[serde(default, alias = "projectData")]
    pub project_data: Option<ProjectData>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePromptResponse {
    pub prompt_content: String,
    pub cached: bool,
}

impl From<GenerateOutcome> for GeneratePromptResponse {
    fn from(outcome: GenerateOutcome) -> Self {
        Self {
            prompt_content: outcome.content,
            cached: outcome.cached,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RateLimitParams {
    #[serde(alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(alias = "promptType")]
    pub prompt_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RateLimitResponse {
    One(RateLimitStatus),
    All { limits: Vec<RateLimitStatus> },
}

/// POST /prompts/{project_id}/generate
pub async fn generate_prompt(
    State(state): State<AppState>,
    RequireSubject(subject): RequireSubject,
    Path(project_id): Path<String>,
    Json(body): Json<GeneratePromptBody>,
) -> Result<Json<GeneratePromptResponse>, ApiError> {
    if body.session_id.trim().is_empty() || body.prompt_type.trim().is_empty() {
        return Err(ApiError::bad_request("Missing sessionId or promptType"));
    }

    info!(
        subject_id = %subject,
        project_id = %project_id,
        prompt_type = %body.prompt_type,
        "Generating prompt"
    );

    let mut request = GenerateRequest::new(project_id, body.prompt_type, body.session_id);
    if let Some(data) = body.project_data {
        request = request.with_project_data(data);
    }

    let outcome = state.generation.generate(request).await?;

    Ok(Json(outcome.into()))
}

/// GET /prompts/rate-limit?session_id=..[&prompt_type=..]
pub async fn rate_limit_status(
    State(state): State<AppState>,
    Query(params): Query<RateLimitParams>,
) -> Result<Json<RateLimitResponse>, ApiError> {
    let session_id = params
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing sessionId"))?;

    let response = match params.prompt_type.filter(|p| !p.trim().is_empty()) {
        Some(prompt_type) => {
            RateLimitResponse::One(state.limiter.status(&session_id, &prompt_type).await?)
        }
        None => RateLimitResponse::All {
            limits: state.limiter.status_all(&session_id).await?,
        },
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_accepts_camel_case_keys() {
        let body: GeneratePromptBody = serde_json::from_value(serde_json::json!({
            "sessionId": "s1",
            "promptType": "architecture",
            "projectData": { "title": "Chat App", "tech_stack": ["Rust"] }
        }))
        .unwrap();

        assert_eq!(body.session_id, "s1");
        assert_eq!(body.prompt_type, "architecture");
        assert_eq!(body.project_data.unwrap().title, "Chat App");
    }

    #[test]
    fn test_body_missing_fields_default_empty() {
        let body: GeneratePromptBody = serde_json::from_value(serde_json::json!({})).unwrap();

        assert!(body.session_id.is_empty());
        assert!(body.project_data.is_none());
    }
}
