use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::usage::{UsageAggregate, UsageQuery};

#[derive(Debug, Deserialize)]
pub struct UsageParams {
    #[serde(alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(alias = "promptType")]
    pub prompt_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub session_id: String,
    pub total_events: u64,
    pub cached_events: u64,
    pub generated_events: u64,
    pub total_tokens: u64,
    pub cache_hit_rate: f64,
}

impl UsageResponse {
    fn new(session_id: String, aggregate: UsageAggregate) -> Self {
        Self {
            session_id,
            cache_hit_rate: aggregate.cache_hit_rate(),
            total_events: aggregate.total_events,
            cached_events: aggregate.cached_events,
            generated_events: aggregate.generated_events,
            total_tokens: aggregate.total_tokens,
        }
    }
}

/// GET /api/usage?session_id=..
pub async fn get_usage(
    State(state): State<AppState>,
    Query(params): Query<UsageParams>,
) -> Result<Json<UsageResponse>, ApiError> {
    let session_id = params
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing sessionId"))?;

    let mut query = UsageQuery::new().with_session(session_id.clone());
    if let Some(prompt_type) = params.prompt_type {
        query = query.with_prompt_type(prompt_type);
    }

    let aggregate = state.usage.aggregate(&query).await?;

    Ok(Json(UsageResponse::new(session_id, aggregate)))
}
